//! Core types and traits for cqldump
//!
//! This crate defines the foundational types shared by the protocol client,
//! the export/import engine and the command line tool:
//! - CqlValue: Typed cell value with its CQL literal rendering
//! - ColumnType: CQL type syntax, parsed and rendered
//! - ConsistencyLevel: Request consistency, with wire codes
//! - Schema metadata: KeyspaceMetadata, TableMetadata, UserType (DDL rendering)
//! - Row / ColumnSpec: Codec-encoded rows as the encoder consumes them
//! - Traits: Cluster access (Session, RowCursor)
//! - Error: Error type hierarchy and exit categories
//! - Limits: Fixed batch, paging and progress constants

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod column_type;
pub mod consistency;
pub mod cql;
pub mod error;
pub mod limits;
pub mod row;
pub mod schema;
pub mod traits;
pub mod value;

pub use column_type::{ColumnType, TypeParseError};
pub use consistency::{ConsistencyLevel, UnknownConsistencyLevel};
pub use cql::{qualified_name, quote_identifier, quote_string};
pub use error::{Error, ErrorCategory, Result};
pub use row::{ColumnSpec, Row};
pub use schema::{
    ClusteringOrder, ColumnKind, ColumnMetadata, IndexKind, IndexMetadata, KeyspaceMetadata,
    TableMetadata, UserType,
};
pub use traits::{RowCursor, Session};
pub use value::CqlValue;
