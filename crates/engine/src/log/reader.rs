//! Statement log reader
//!
//! Splits a line-oriented stream into [`LogEntry`] values. Lines are
//! accumulated with their own line endings until a line ends with `;`, so a
//! `\r\n` inside a quoted value survives the trip. Only the surrounding
//! whitespace and the `;` are stripped from the yielded text. Blank lines between
//! statements are skipped. Whatever is left when the stream ends is yielded
//! once as [`LogEntry::Unterminated`].

use std::io::BufRead;

use cqldump_core::{ConsistencyLevel, Error, Result};

use super::DIRECTIVE_PREFIX;

/// One unit of a statement log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// `CONSISTENCY <LEVEL>;`
    Directive {
        /// Requested level
        level: ConsistencyLevel,
        /// 1-based line of the terminator
        line: usize,
    },
    /// A terminated statement, without its `;`
    Statement {
        /// Statement text
        text: String,
        /// 1-based line of the terminator
        line: usize,
    },
    /// Non-blank text after the last terminator
    Unterminated {
        /// Statement text
        text: String,
        /// 1-based line the tail ends on
        line: usize,
    },
}

/// Iterator over the entries of a statement log
pub struct StatementReader<R> {
    input: R,
    buf: String,
    line: usize,
    accumulator: String,
    done: bool,
}

impl<R: BufRead> StatementReader<R> {
    /// Read entries from `input`
    pub fn new(input: R) -> Self {
        StatementReader {
            input,
            buf: String::new(),
            line: 0,
            accumulator: String::new(),
            done: false,
        }
    }

    fn classify(&self, text: &str) -> Result<LogEntry> {
        let statement = text.trim();
        let body = statement
            .strip_suffix(';')
            .unwrap_or(statement)
            .trim_end()
            .to_string();

        if is_directive(&body) {
            let name = body[DIRECTIVE_PREFIX.len()..].trim();
            let level = name
                .parse::<ConsistencyLevel>()
                .map_err(|e| Error::MalformedLog {
                    line: self.line,
                    reason: e.to_string(),
                })?;
            return Ok(LogEntry::Directive {
                level,
                line: self.line,
            });
        }
        Ok(LogEntry::Statement {
            text: body,
            line: self.line,
        })
    }
}

impl<R: BufRead> Iterator for StatementReader<R> {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            match self.input.read_line(&mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    let tail = std::mem::take(&mut self.accumulator);
                    let tail = tail.trim();
                    if tail.is_empty() {
                        return None;
                    }
                    return Some(Ok(LogEntry::Unterminated {
                        text: tail.to_string(),
                        line: self.line,
                    }));
                }
                Ok(_) => {
                    self.line += 1;
                    if self.accumulator.is_empty() && self.buf.trim().is_empty() {
                        continue;
                    }
                    self.accumulator.push_str(&self.buf);

                    if self.buf.trim_end().ends_with(';') {
                        let text = std::mem::take(&mut self.accumulator);
                        return Some(self.classify(&text));
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(Error::from(e)));
                }
            }
        }
    }
}

/// Whether a statement is a `CONSISTENCY` directive (case-insensitive)
pub fn is_directive(statement: &str) -> bool {
    statement
        .get(..DIRECTIVE_PREFIX.len())
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case(DIRECTIVE_PREFIX))
}
