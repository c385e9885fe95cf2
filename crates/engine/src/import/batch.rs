//! Pending batch
//!
//! Bounded FIFO of statements waiting to run at the active consistency
//! level. The replayer drains it before any statement that must not overtake
//! it: a level change, a non-batchable statement, a full buffer, end of log.

/// Ordered, size-bounded statement buffer
#[derive(Debug)]
pub struct PendingBatch {
    statements: Vec<String>,
    capacity: usize,
}

impl PendingBatch {
    /// Create an empty batch that fills at `capacity` statements
    pub fn new(capacity: usize) -> Self {
        PendingBatch {
            statements: Vec::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    /// Append a statement; returns `true` once the batch is full
    pub fn push(&mut self, statement: String) -> bool {
        self.statements.push(statement);
        self.is_full()
    }

    /// Whether the batch reached its capacity
    pub fn is_full(&self) -> bool {
        self.statements.len() >= self.capacity
    }

    /// Number of buffered statements
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Remove and return every buffered statement, oldest first
    pub fn drain(&mut self) -> std::vec::Drain<'_, String> {
        self.statements.drain(..)
    }
}
