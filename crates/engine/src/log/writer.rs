//! Statement log writer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use cqldump_core::{ConsistencyLevel, Result};

use super::DIRECTIVE_PREFIX;

/// Appends directives and `;`-terminated statements to a log.
///
/// Output is buffered; call [`finish`](Self::finish) to flush. Dropping the
/// writer without finishing still flushes through `BufWriter`'s drop but
/// swallows the error.
pub struct StatementLogWriter<W: Write> {
    out: W,
    statements: u64,
    directives: u64,
}

impl StatementLogWriter<BufWriter<File>> {
    /// Create (or truncate) a log file
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(StatementLogWriter::new(BufWriter::new(file)))
    }
}

impl<W: Write> StatementLogWriter<W> {
    /// Wrap an output stream
    pub fn new(out: W) -> Self {
        StatementLogWriter {
            out,
            statements: 0,
            directives: 0,
        }
    }

    /// Write a `CONSISTENCY <LEVEL>;` line
    pub fn consistency(&mut self, level: ConsistencyLevel) -> Result<()> {
        writeln!(self.out, "{}{};", DIRECTIVE_PREFIX, level)?;
        self.directives += 1;
        Ok(())
    }

    /// Write a statement, adding the `;` terminator if it is missing
    ///
    /// `text` may span several lines and may itself hold several terminated
    /// statements (a rendered keyspace schema, for instance).
    pub fn statement(&mut self, text: &str) -> Result<()> {
        let text = text.trim_end();
        if text.is_empty() {
            return Ok(());
        }
        if text.ends_with(';') {
            writeln!(self.out, "{}", text)?;
        } else {
            writeln!(self.out, "{};", text)?;
        }
        self.statements += 1;
        Ok(())
    }

    /// Number of statements written so far
    pub fn statements_written(&self) -> u64 {
        self.statements
    }

    /// Number of directives written so far
    pub fn directives_written(&self) -> u64 {
        self.directives
    }

    /// Flush buffered output
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Flush and return the underlying stream
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_terminated_lines() {
        let mut writer = StatementLogWriter::new(Vec::new());
        writer.consistency(ConsistencyLevel::All).unwrap();
        writer.statement("DROP KEYSPACE IF EXISTS \"ks\"").unwrap();
        writer.statement("CREATE TABLE t (\n    id int PRIMARY KEY\n);\n").unwrap();
        writer.statement("   ").unwrap();
        assert_eq!(writer.statements_written(), 2);
        assert_eq!(writer.directives_written(), 1);

        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            "CONSISTENCY ALL;\nDROP KEYSPACE IF EXISTS \"ks\";\nCREATE TABLE t (\n    id int PRIMARY KEY\n);\n"
        );
    }

    #[test]
    fn test_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.cql");
        let mut writer = StatementLogWriter::create(&path).unwrap();
        writer.consistency(ConsistencyLevel::One).unwrap();
        writer.finish().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "CONSISTENCY ONE;\n");
    }
}
