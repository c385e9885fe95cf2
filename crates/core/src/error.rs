//! Error types for cqldump
//!
//! This module defines the single error type shared by every crate in the
//! workspace. We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! Every error aborts the operation that raised it: there is no per-row or
//! per-statement continue-on-error mode. [`ErrorCategory`] tells the hosting
//! process which exit code family an error belongs to.

use std::io;
use thiserror::Error;

/// Result type alias for cqldump operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for export, import and cluster access
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-validated misuse, detected before any cluster interaction
    #[error("configuration error: {reason}")]
    Configuration {
        /// What is wrong with the configuration
        reason: String,
    },

    /// A referenced keyspace does not exist in the cluster metadata
    #[error("can't find keyspace {keyspace}")]
    KeyspaceNotFound {
        /// Keyspace name as given by the caller
        keyspace: String,
    },

    /// A referenced table does not exist in its keyspace
    #[error("can't find table \"{table}\" in keyspace {keyspace}")]
    TableNotFound {
        /// Keyspace name
        keyspace: String,
        /// Table name as given by the caller
        table: String,
    },

    /// A statement or query failed against the cluster
    #[error("failed to execute `{statement}`: {reason}")]
    Execution {
        /// Statement text, as sent
        statement: String,
        /// Failure description from the session
        reason: String,
    },

    /// The server answered a request with an ERROR frame
    #[error("server error 0x{code:04x}: {message}")]
    Server {
        /// Native protocol error code
        code: i32,
        /// Server-supplied message
        message: String,
    },

    /// Could not establish or keep a connection to the cluster
    #[error("connection error: {0}")]
    Connection(String),

    /// Unexpected or undecodable native protocol data
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A directive in the statement log could not be understood
    #[error("malformed statement log at line {line}: {reason}")]
    MalformedLog {
        /// 1-based line number where the offending statement ends
        line: usize,
        /// What could not be parsed
        reason: String,
    },

    /// A blocking operation was interrupted
    #[error("interrupted: {0}")]
    Interrupted(String),

    /// I/O error (log files, sockets)
    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::Interrupted {
            Error::Interrupted(e.to_string())
        } else {
            Error::Io(e)
        }
    }
}

/// Broad error families, used by the host to pick an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad arguments or unsupported options
    Configuration,
    /// Transport or handshake failure
    Connection,
    /// Interrupted while blocked
    Interrupted,
    /// File I/O or unreadable statement log
    Io,
    /// Missing keyspace or table
    SchemaLookup,
    /// A statement failed on the cluster
    Execution,
}

impl Error {
    /// Build a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Error::Configuration {
            reason: reason.into(),
        }
    }

    /// Build an execution error for `statement`
    pub fn execution(statement: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Execution {
            statement: statement.into(),
            reason: reason.into(),
        }
    }

    /// Build an error for an option that exists only to be refused
    pub fn unimplemented(feature: &str) -> Self {
        Error::Configuration {
            reason: format!("UNIMPLEMENTED FEATURE: {}", feature),
        }
    }

    /// The error family this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Configuration { .. } => ErrorCategory::Configuration,
            Error::KeyspaceNotFound { .. } | Error::TableNotFound { .. } => {
                ErrorCategory::SchemaLookup
            }
            Error::Execution { .. } | Error::Server { .. } => ErrorCategory::Execution,
            Error::Connection(_) | Error::Protocol(_) => ErrorCategory::Connection,
            Error::Interrupted(_) => ErrorCategory::Interrupted,
            Error::MalformedLog { .. } | Error::Io(_) => ErrorCategory::Io,
        }
    }
}
