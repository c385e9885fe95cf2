//! Statement log replay
//!
//! Replays a statement log against a [`Session`], in log order.
//!
//! # Replay Rules
//!
//! - **Directives**: `CONSISTENCY <LEVEL>;` is never sent to the cluster. A
//!   different level first flushes the pending batch at the old level, then
//!   becomes active. Repeating the active level does nothing.
//! - **Batchable**: statements starting with `INSERT` or `UPDATE`
//!   (case-insensitive) are buffered in a [`PendingBatch`] unless `sync` is
//!   set. A full batch is flushed immediately.
//! - **Everything else**: flushes the pending batch, then executes.
//! - **End of log**: the pending batch is flushed; an unterminated tail is
//!   executed anyway, with a warning.
//!
//! Every statement runs at the level active when it was read, and no
//! statement overtakes one read before it. The first failure aborts the
//! replay; statements already executed stay applied.
//!
//! Replaying counter UPDATEs is not idempotent: every replay adds the
//! exported values again.
//!
//! # Usage
//!
//! ```ignore
//! let stats = Replayer::new(&mut session, ImportOptions::new())?
//!     .replay_file(Path::new("dump.cql"))?;
//! ```

mod batch;
mod options;

pub use batch::PendingBatch;
pub use options::{Dispatch, ImportOptions};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use cqldump_core::{ConsistencyLevel, Result, Session};
use tracing::{debug, info, warn};

use crate::log::{LogEntry, StatementReader};
use crate::progress::Progress;

/// Statistics from one replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Directives read
    pub directives: usize,
    /// Directives that changed the active level
    pub level_changes: usize,
    /// Statements sent to the cluster
    pub statements_executed: usize,
    /// Statements that went through the pending batch
    pub statements_batched: usize,
    /// Non-empty batch flushes
    pub flushes: usize,
    /// Whether the log ended with an unterminated statement
    pub unterminated_tail: bool,
}

impl ReplayStats {
    /// Create empty stats
    pub fn new() -> Self {
        ReplayStats::default()
    }

    /// Check if any statement was executed
    pub fn has_statements(&self) -> bool {
        self.statements_executed > 0
    }
}

/// Whether a statement may wait in the pending batch
pub fn is_batchable(statement: &str) -> bool {
    let head = statement.trim_start();
    ["INSERT", "UPDATE"].iter().any(|keyword| {
        head.get(..keyword.len())
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case(keyword))
    })
}

/// Replay state machine for one run
pub struct Replayer<'a, S: Session + ?Sized> {
    session: &'a mut S,
    options: ImportOptions,
    progress: Progress,
    active: ConsistencyLevel,
    pending: PendingBatch,
    stats: ReplayStats,
}

impl<'a, S: Session + ?Sized> Replayer<'a, S> {
    /// Create a replayer; the options are validated first
    pub fn new(session: &'a mut S, options: ImportOptions) -> Result<Self> {
        options.validate()?;
        Ok(Replayer {
            session,
            progress: Progress::new(options.quiet),
            active: ConsistencyLevel::One,
            pending: PendingBatch::new(options.batch_capacity),
            stats: ReplayStats::new(),
            options,
        })
    }

    /// Replace the progress printer (builder pattern)
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Level statements currently run at
    pub fn active_level(&self) -> ConsistencyLevel {
        self.active
    }

    /// Replay the log at `path`
    pub fn replay_file(self, path: &Path) -> Result<ReplayStats> {
        info!(path = %path.display(), "Importing statement log");
        let file = File::open(path)?;
        self.replay(BufReader::new(file))
    }

    /// Replay a log from any buffered reader
    pub fn replay<R: BufRead>(mut self, input: R) -> Result<ReplayStats> {
        for entry in StatementReader::new(input) {
            match entry? {
                LogEntry::Directive { level, .. } => self.apply_directive(level)?,
                LogEntry::Statement { text, .. } => self.apply_statement(text)?,
                LogEntry::Unterminated { text, line } => {
                    warn!(line, "Executing unterminated statement at end of log");
                    self.stats.unterminated_tail = true;
                    self.flush()?;
                    self.execute(&text)?;
                }
            }
            self.progress.tick();
        }
        self.flush()?;
        self.progress.end_block();

        info!(
            executed = self.stats.statements_executed,
            batched = self.stats.statements_batched,
            flushes = self.stats.flushes,
            level_changes = self.stats.level_changes,
            "Import complete"
        );
        Ok(self.stats)
    }

    fn apply_directive(&mut self, level: ConsistencyLevel) -> Result<()> {
        self.stats.directives += 1;
        if level == self.active {
            return Ok(());
        }
        self.flush()?;
        debug!(from = %self.active, to = %level, "Consistency level changed");
        self.active = level;
        self.stats.level_changes += 1;
        Ok(())
    }

    fn apply_statement(&mut self, text: String) -> Result<()> {
        if !self.options.sync && is_batchable(&text) {
            self.stats.statements_batched += 1;
            if self.pending.push(text) {
                self.flush()?;
            }
            return Ok(());
        }
        self.flush()?;
        self.execute(&text)
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let level = self.active;
        debug!(size = self.pending.len(), level = %level, "Flushing pending batch");
        for statement in self.pending.drain() {
            self.session.execute(&statement, level)?;
            self.stats.statements_executed += 1;
        }
        self.stats.flushes += 1;
        Ok(())
    }

    fn execute(&mut self, statement: &str) -> Result<()> {
        self.session.execute(statement, self.active)?;
        self.stats.statements_executed += 1;
        Ok(())
    }
}

/// Replay the log at `path` against `session`
pub fn import_file<S: Session + ?Sized>(
    session: &mut S,
    path: &Path,
    options: ImportOptions,
) -> Result<ReplayStats> {
    Replayer::new(session, options)?.replay_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSession;
    use cqldump_core::Error;

    fn replay(log: &str, options: ImportOptions) -> (RecordingSession, Result<ReplayStats>) {
        let mut session = RecordingSession::new();
        let result = Replayer::new(&mut session, options.with_quiet(true))
            .and_then(|r| r.replay(log.as_bytes()));
        (session, result)
    }

    fn order(session: &RecordingSession) -> Vec<&str> {
        session.executed().iter().map(|(s, _)| s.as_str()).collect()
    }

    #[test]
    fn test_is_batchable() {
        assert!(is_batchable("INSERT INTO t (a) VALUES (1)"));
        assert!(is_batchable("  update t SET c = c + 1 WHERE k = 1"));
        assert!(!is_batchable("DROP TABLE t"));
        assert!(!is_batchable("INS"));
    }

    #[test]
    fn test_level_change_flushes_at_old_level() {
        let log = "INSERT A;\nINSERT B;\nCONSISTENCY QUORUM;\nINSERT C;\n";
        let (session, result) = replay(log, ImportOptions::new());
        let stats = result.unwrap();
        assert_eq!(
            session.executed(),
            &[
                ("INSERT A".to_string(), ConsistencyLevel::One),
                ("INSERT B".to_string(), ConsistencyLevel::One),
                ("INSERT C".to_string(), ConsistencyLevel::Quorum),
            ]
        );
        assert_eq!(stats.flushes, 2);
        assert_eq!(stats.level_changes, 1);
    }

    #[test]
    fn test_repeated_level_does_not_flush() {
        let log = "CONSISTENCY ONE;\nINSERT A;\nCONSISTENCY ONE;\nINSERT B;\n";
        let (session, result) = replay(log, ImportOptions::new());
        let stats = result.unwrap();
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.level_changes, 0);
        assert_eq!(stats.directives, 2);
        assert_eq!(order(&session), vec!["INSERT A", "INSERT B"]);
    }

    #[test]
    fn test_other_statements_flush_first() {
        let log = "INSERT A;\nCREATE X;\nUPDATE B;\n";
        let (session, result) = replay(log, ImportOptions::new());
        result.unwrap();
        assert_eq!(order(&session), vec!["INSERT A", "CREATE X", "UPDATE B"]);
    }

    #[test]
    fn test_full_batch_flushes() {
        let log = "INSERT A;\nINSERT B;\nINSERT C;\n";
        let (_, result) = replay(log, ImportOptions::new().with_batch_capacity(2));
        let stats = result.unwrap();
        assert_eq!(stats.flushes, 2);
        assert_eq!(stats.statements_executed, 3);
    }

    #[test]
    fn test_sync_bypasses_batch() {
        let log = "INSERT A;\nINSERT B;\n";
        let (_, result) = replay(log, ImportOptions::new().with_sync(true));
        let stats = result.unwrap();
        assert_eq!(stats.statements_batched, 0);
        assert_eq!(stats.flushes, 0);
        assert_eq!(stats.statements_executed, 2);
    }

    #[test]
    fn test_unterminated_tail_runs_after_pending() {
        let log = "CONSISTENCY TWO;\nINSERT A;\nINSERT B";
        let (session, result) = replay(log, ImportOptions::new());
        let stats = result.unwrap();
        assert!(stats.unterminated_tail);
        assert_eq!(
            session.executed(),
            &[
                ("INSERT A".to_string(), ConsistencyLevel::Two),
                ("INSERT B".to_string(), ConsistencyLevel::Two),
            ]
        );
    }

    #[test]
    fn test_failure_aborts_without_rollback() {
        let mut session = RecordingSession::new().failing_on("BAD");
        let log = "INSERT A;\nCREATE BAD;\nINSERT C;\n";
        let err = Replayer::new(&mut session, ImportOptions::new().with_quiet(true))
            .unwrap()
            .replay(log.as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
        assert_eq!(order(&session), vec!["INSERT A"]);
    }

    #[test]
    fn test_malformed_directive_aborts() {
        let (_, result) = replay("CONSISTENCY SOME;\n", ImportOptions::new());
        assert!(matches!(result, Err(Error::MalformedLog { line: 1, .. })));
    }

    #[test]
    fn test_concurrent_dispatch_rejected_before_reading() {
        let (session, result) = replay(
            "INSERT A;\n",
            ImportOptions::new().with_dispatch(Dispatch::Concurrent),
        );
        assert!(matches!(result, Err(Error::Configuration { .. })));
        assert!(session.executed().is_empty());
    }

    #[test]
    fn test_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.cql");
        std::fs::write(&path, "CONSISTENCY ALL;\nDROP X;\n").unwrap();
        let mut session = RecordingSession::new();
        let stats = import_file(&mut session, &path, ImportOptions::new().with_quiet(true)).unwrap();
        assert_eq!(stats.statements_executed, 1);
        assert_eq!(
            session.executed(),
            &[("DROP X".to_string(), ConsistencyLevel::All)]
        );
    }
}
