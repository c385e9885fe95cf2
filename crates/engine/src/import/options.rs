//! Import configuration

use cqldump_core::limits::CONCURRENT_BATCH_SIZE;
use cqldump_core::{Error, Result};

/// How batched statements are dispatched when the pending batch flushes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// One statement at a time, in log order
    #[default]
    Sequential,
    /// Concurrent execution of a flushed batch; not implemented
    Concurrent,
}

/// Import configuration parameters.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Execute every statement immediately, never batching
    pub sync: bool,

    /// Dispatch strategy for flushed batches
    pub dispatch: Dispatch,

    /// Statements held before the pending batch flushes (default: 1000)
    pub batch_capacity: usize,

    /// Suppress progress output
    pub quiet: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            sync: false,
            dispatch: Dispatch::Sequential,
            batch_capacity: CONCURRENT_BATCH_SIZE,
            quiet: false,
        }
    }
}

impl ImportOptions {
    /// Create import options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force synchronous execution (builder pattern).
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Set dispatch strategy (builder pattern).
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Set batch capacity (builder pattern).
    pub fn with_batch_capacity(mut self, capacity: usize) -> Self {
        self.batch_capacity = capacity;
        self
    }

    /// Suppress progress output (builder pattern).
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.dispatch == Dispatch::Concurrent {
            return Err(Error::unimplemented("concurrent import dispatch"));
        }
        if self.batch_capacity == 0 {
            return Err(Error::configuration("batch capacity must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ImportOptions::default();
        assert!(!options.sync);
        assert_eq!(options.dispatch, Dispatch::Sequential);
        assert_eq!(options.batch_capacity, 1000);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_concurrent_dispatch_rejected() {
        let err = ImportOptions::new()
            .with_dispatch(Dispatch::Concurrent)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("UNIMPLEMENTED FEATURE"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            ImportOptions::new().with_batch_capacity(0).validate(),
            Err(Error::Configuration { .. })
        ));
    }
}
