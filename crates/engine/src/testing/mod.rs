//! Test doubles for [`Session`]
//!
//! [`MemoryCluster`] interprets the CQL a dump contains and answers queries
//! from its own tables. [`RecordingSession`] only records what it is asked to
//! execute, for tests that care about order and consistency levels rather
//! than effects.

mod cql;
mod literal;
mod memory;

pub use memory::{MemoryCluster, MemorySession};

use cqldump_core::{
    ColumnSpec, ConsistencyLevel, CqlValue, Error, KeyspaceMetadata, Result, RowCursor, Session,
};

/// Session that records executed statements and knows no keyspaces
#[derive(Debug, Default)]
pub struct RecordingSession {
    executed: Vec<(String, ConsistencyLevel)>,
    fail_on: Vec<String>,
}

impl RecordingSession {
    /// Create a session that accepts everything
    pub fn new() -> Self {
        RecordingSession::default()
    }

    /// Fail every statement containing `needle` (builder pattern)
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    /// Statements executed successfully, in order, with their levels
    pub fn executed(&self) -> &[(String, ConsistencyLevel)] {
        &self.executed
    }
}

struct EmptyCursor;

impl RowCursor for EmptyCursor {
    fn columns(&self) -> &[ColumnSpec] {
        &[]
    }

    fn next_row(&mut self) -> Result<Option<Vec<CqlValue>>> {
        Ok(None)
    }
}

impl Session for RecordingSession {
    fn keyspace_names(&mut self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn keyspace(&mut self, _name: &str) -> Result<Option<KeyspaceMetadata>> {
        Ok(None)
    }

    fn execute(&mut self, statement: &str, consistency: ConsistencyLevel) -> Result<()> {
        if self.fail_on.iter().any(|n| statement.contains(n.as_str())) {
            return Err(Error::execution(statement, "injected failure"));
        }
        self.executed.push((statement.to_string(), consistency));
        Ok(())
    }

    fn query(
        &mut self,
        _query: &str,
        _consistency: ConsistencyLevel,
    ) -> Result<Box<dyn RowCursor + '_>> {
        Ok(Box::new(EmptyCursor))
    }
}
