//! Export and import engine for cqldump
//!
//! This crate turns a cluster's schema and rows into a statement log and
//! replays such a log:
//! - Encoder: one row to one INSERT or counter UPDATE
//! - Log: statement log writer and reader
//! - Export: selection, schema statements, row blocks
//! - Import: consistency directives, pending batch, ordered replay
//! - Testing: in-process cluster for round trips
//!
//! The engine talks to the cluster only through [`cqldump_core::Session`],
//! so the same code drives the native protocol session and the test doubles.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoder;
pub mod export;
pub mod import;
pub mod log;
pub mod progress;
pub mod testing;

pub use encoder::{encode, RowEncoder};
pub use export::{export_to_file, ExportOptions, ExportStats, Exporter, FilterSpec, Selection, TableRef};
pub use import::{import_file, is_batchable, Dispatch, ImportOptions, PendingBatch, ReplayStats, Replayer};
pub use log::{LogEntry, StatementLogWriter, StatementReader};
pub use progress::Progress;
