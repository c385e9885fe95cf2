//! Cluster access traits
//!
//! [`Session`] is the explicit cluster handle the export orchestrator and the
//! import replayer are given. Implementations own their connection and
//! release it on drop, so every exit path (including errors) releases it.
//!
//! [`RowCursor`] is a forward-only, lazily paged result. Callers consume it
//! one row at a time and never need the full result set in memory.

use crate::consistency::ConsistencyLevel;
use crate::error::Result;
use crate::row::ColumnSpec;
use crate::schema::KeyspaceMetadata;
use crate::value::CqlValue;

/// Forward-only row source
pub trait RowCursor {
    /// Result-set columns, in the order values are yielded
    fn columns(&self) -> &[ColumnSpec];

    /// Next row, fetching another page if needed; `None` when exhausted
    ///
    /// # Errors
    ///
    /// Returns an error if fetching the next page fails.
    fn next_row(&mut self) -> Result<Option<Vec<CqlValue>>>;
}

/// A connected cluster session
pub trait Session {
    /// Names of every keyspace, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if schema metadata cannot be read.
    fn keyspace_names(&mut self) -> Result<Vec<String>>;

    /// Full metadata for one keyspace, `None` if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if schema metadata cannot be read.
    fn keyspace(&mut self, name: &str) -> Result<Option<KeyspaceMetadata>>;

    /// Execute a statement that returns no rows of interest
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`](crate::Error::Execution) or
    /// [`Error::Server`](crate::Error::Server) if the cluster rejects it.
    fn execute(&mut self, statement: &str, consistency: ConsistencyLevel) -> Result<()>;

    /// Run a query and return a cursor over its rows
    ///
    /// # Errors
    ///
    /// Returns an error if the first page cannot be fetched.
    fn query(
        &mut self,
        query: &str,
        consistency: ConsistencyLevel,
    ) -> Result<Box<dyn RowCursor + '_>>;
}
