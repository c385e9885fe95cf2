//! Statement log
//!
//! A statement log is plain CQL text: one statement per line for data, any
//! number of lines for DDL, and `CONSISTENCY <LEVEL>;` directive lines that
//! set the level later statements run at. A statement ends at the first line
//! whose text (ignoring trailing whitespace) ends with `;`.
//!
//! ```text
//! CONSISTENCY ALL;
//! DROP KEYSPACE IF EXISTS "ks";
//! CREATE KEYSPACE "ks" WITH replication = {...} AND durable_writes = true;
//! CONSISTENCY ONE;
//! INSERT INTO "ks"."t" ("id") VALUES (1);
//! ```
//!
//! A `;` at the end of a line inside a quoted multi-line string is read as a
//! terminator. Text values with embedded newlines can trip this.

mod reader;
mod writer;

pub use reader::{is_directive, LogEntry, StatementReader};
pub use writer::StatementLogWriter;

/// Prefix of a consistency directive
pub const DIRECTIVE_PREFIX: &str = "CONSISTENCY ";
