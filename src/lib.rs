//! cqldump - dump a Cassandra cluster to a replayable CQL statement log
//!
//! An export walks the selected keyspaces and tables and writes one
//! executable statement per line: schema first, then one INSERT (or counter
//! UPDATE) per row, with `CONSISTENCY` directives marking how each section
//! should be replayed. An import reads the same log back and executes it.
//!
//! # Quick Start
//!
//! ```ignore
//! use cqldump::{export_to_file, ConnectOptions, ExportOptions, NativeSession, Selection};
//!
//! let mut session = NativeSession::connect(&ConnectOptions::new().with_host("db1"))?;
//! let options = ExportOptions::new().with_selection(Selection::Keyspaces(vec!["shop".into()]));
//! let stats = export_to_file(&mut session, "shop.cql".as_ref(), options)?;
//! ```
//!
//! # Architecture
//!
//! - `cqldump-core`: values, types, schema metadata, the `Session` seam, errors
//! - `cqldump-protocol`: native protocol v4 client implementing `Session`
//! - `cqldump-engine`: row encoder, statement log, exporter and replayer
//! - `cqldump-cli`: the `cqldump` binary

pub use cqldump_core::{
    ColumnType, ConsistencyLevel, CqlValue, Error, ErrorCategory, KeyspaceMetadata, Result,
    RowCursor, Session, TableMetadata,
};
pub use cqldump_engine::{
    export_to_file, import_file, Dispatch, ExportOptions, ExportStats, Exporter, FilterSpec,
    ImportOptions, ReplayStats, Replayer, Selection, StatementLogWriter, StatementReader,
    TableRef,
};
pub use cqldump_protocol::{ConnectOptions, NativeSession};

/// In-memory sessions for tests
pub mod testing {
    pub use cqldump_engine::testing::{MemoryCluster, MemorySession, RecordingSession};
}
