//! Progress dots
//!
//! One `.` per [`DOT_EVERY`] units of work, and a closing newline when a block
//! printed at least one full line's worth. Output goes to stdout unless the
//! run is quiet. Write failures are ignored; progress is cosmetic.

use std::io::Write;

use cqldump_core::limits::DOT_EVERY;

/// Dot printer for one run
pub struct Progress {
    sink: Option<Box<dyn Write + Send>>,
    every: u64,
    count: u64,
}

impl Progress {
    /// Progress on stdout, or nothing when `quiet`
    pub fn new(quiet: bool) -> Self {
        if quiet {
            Progress::hidden()
        } else {
            Progress::to_writer(Box::new(std::io::stdout()))
        }
    }

    /// Progress that prints nothing
    pub fn hidden() -> Self {
        Progress {
            sink: None,
            every: DOT_EVERY,
            count: 0,
        }
    }

    /// Progress written to `sink`
    pub fn to_writer(sink: Box<dyn Write + Send>) -> Self {
        Progress {
            sink: Some(sink),
            every: DOT_EVERY,
            count: 0,
        }
    }

    /// Change the dot interval (builder pattern)
    pub fn with_interval(mut self, every: u64) -> Self {
        self.every = every.max(1);
        self
    }

    /// Count one unit of work
    pub fn tick(&mut self) {
        self.count += 1;
        if self.count % self.every == 0 {
            self.emit(".");
        }
    }

    /// Units counted in the current block
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Close the current block and start counting from zero
    pub fn end_block(&mut self) {
        if self.count > self.every {
            self.emit("\n");
        }
        self.count = 0;
    }

    fn emit(&mut self, text: &str) {
        if let Some(sink) = self.sink.as_mut() {
            let _ = sink.write_all(text.as_bytes());
            let _ = sink.flush();
        }
    }
}
