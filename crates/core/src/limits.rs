//! Fixed operating limits and defaults
//!
//! These values match the behavior the statement log format was designed
//! around; changing them changes observable output (progress output, batch
//! flush points), not correctness.

/// Statements buffered before the pending batch is flushed
pub const CONCURRENT_BATCH_SIZE: usize = 1000;

/// Rows (export) or statements (import) between progress dots
pub const DOT_EVERY: u64 = 1000;

/// Rows requested per page when reading a table
pub const FETCH_SIZE: i32 = 100;

/// Per-request timeout, in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default connect timeout, in seconds
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default native transport port
pub const DEFAULT_PORT: u16 = 9042;

/// Keyspaces skipped when no selection is given
pub const SYSTEM_KEYSPACES: [&str; 2] = ["system", "system_traces"];

/// Whether `keyspace` is skipped by a whole-cluster export
pub fn is_system_keyspace(keyspace: &str) -> bool {
    SYSTEM_KEYSPACES.contains(&keyspace)
}
