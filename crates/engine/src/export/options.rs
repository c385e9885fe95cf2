//! Export configuration

use cqldump_core::{Error, Result};

use super::selection::Selection;

/// Export configuration parameters.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// What to export
    pub selection: Selection,

    /// Tables left out of keyspace exports, as `table` or `ks.table`
    pub exclude: Vec<String>,

    /// Skip DROP and CREATE statements
    pub no_create: bool,

    /// Skip row data
    pub no_insert: bool,

    /// Maximum rows read per table or filter
    pub limit: Option<u32>,

    /// Suppress progress output
    pub quiet: bool,
}

impl ExportOptions {
    /// Create export options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selection (builder pattern).
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Set the exclude list (builder pattern).
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Skip schema statements (builder pattern).
    pub fn with_no_create(mut self, no_create: bool) -> Self {
        self.no_create = no_create;
        self
    }

    /// Skip row data (builder pattern).
    pub fn with_no_insert(mut self, no_insert: bool) -> Self {
        self.no_insert = no_insert;
        self
    }

    /// Limit rows per table (builder pattern).
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Suppress progress output (builder pattern).
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Whether `keyspace.table` is on the exclude list
    pub fn is_excluded(&self, keyspace: &str, table: &str) -> bool {
        self.exclude.iter().any(|entry| match entry.split_once('.') {
            Some((ks, t)) => ks == keyspace && t == table,
            None => entry == table,
        })
    }

    /// ` LIMIT n` when a limit is set, empty otherwise
    pub fn limit_clause(&self) -> String {
        self.limit
            .map(|n| format!(" LIMIT {}", n))
            .unwrap_or_default()
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.limit == Some(0) {
            return Err(Error::configuration("limit must be greater than zero"));
        }
        if self.exclude.iter().any(|e| e.trim().is_empty()) {
            return Err(Error::configuration("empty --exclude-cf entry"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExportOptions::new();
        assert_eq!(options.selection, Selection::All);
        assert!(!options.no_create && !options.no_insert);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_exclude_matches_bare_and_qualified() {
        let options = ExportOptions::new()
            .with_exclude(vec!["audit".to_string(), "ks.big".to_string()]);
        assert!(options.is_excluded("ks", "audit"));
        assert!(options.is_excluded("other", "audit"));
        assert!(options.is_excluded("ks", "big"));
        assert!(!options.is_excluded("other", "big"));
        assert!(!options.is_excluded("ks", "users"));
    }

    #[test]
    fn test_limit_clause() {
        assert_eq!(ExportOptions::new().limit_clause(), "");
        assert_eq!(
            ExportOptions::new().with_limit(Some(5)).limit_clause(),
            " LIMIT 5"
        );
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = ExportOptions::new().with_limit(Some(0)).validate().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
