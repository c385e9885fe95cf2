//! Connection configuration via `cqldump.toml`
//!
//! Every field has a default, so an empty file is valid. Command-line flags
//! override whatever the file sets.
//!
//! ```toml
//! host = "cassandra-1.internal"
//! port = 9042
//! connect_timeout_secs = 5
//! request_timeout_secs = 120
//! page_size = 100
//!
//! # authentication needs a protocol version
//! # protocol_version = 4
//! # username = "dump"
//! # password = "secret"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use cqldump_core::limits::{CONNECT_TIMEOUT_SECS, DEFAULT_PORT, FETCH_SIZE, REQUEST_TIMEOUT_SECS};
use cqldump_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "cqldump.toml";

/// How to reach and authenticate against a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    /// Address of any node in the cluster
    pub host: String,
    /// Native protocol port
    pub port: u16,
    /// TCP connect timeout
    pub connect_timeout_secs: u64,
    /// Per-request read/write timeout
    pub request_timeout_secs: u64,
    /// Rows per result page
    pub page_size: i32,
    /// Protocol version requested on the command line; enables authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<u8>,
    /// User for PasswordAuthenticator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for PasswordAuthenticator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Use TLS
    pub ssl: bool,
    /// CA certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certfile: Option<PathBuf>,
    /// Client key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userkey: Option<PathBuf>,
    /// Client certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usercert: Option<PathBuf>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            page_size: FETCH_SIZE,
            protocol_version: None,
            username: None,
            password: None,
            ssl: false,
            certfile: None,
            userkey: None,
            usercert: None,
        }
    }
}

impl ConnectOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| {
            Error::configuration(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Set host (builder pattern).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set port (builder pattern).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set connect timeout in seconds (builder pattern).
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Set protocol version (builder pattern).
    pub fn with_protocol_version(mut self, version: u8) -> Self {
        self.protocol_version = Some(version);
        self
    }

    /// Set credentials (builder pattern).
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Connect timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Credentials to send, if authentication is enabled
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.protocol_version?;
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::configuration("host must not be empty"));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(Error::configuration("timeouts must be at least one second"));
        }
        if self.page_size <= 0 {
            return Err(Error::configuration("page size must be positive"));
        }
        if self.userkey.is_some() != self.usercert.is_some() {
            return Err(Error::configuration(
                "--userkey and --usercert must both be provided",
            ));
        }
        if self.ssl && self.certfile.is_none() {
            return Err(Error::configuration(
                "--certfile must also be specified when using --ssl",
            ));
        }
        match self.protocol_version {
            Some(1) => {
                return Err(Error::unimplemented(
                    "--protocol-version 1; please specify a protocol-version of 2 or higher",
                ))
            }
            Some(v) if v > 4 => {
                return Err(Error::configuration(format!(
                    "unsupported protocol version {}",
                    v
                )))
            }
            Some(_) if self.username.is_none() || self.password.is_none() => {
                return Err(Error::configuration(
                    "--username and --password are required with --protocol-version",
                ))
            }
            _ => {}
        }
        if self.ssl {
            return Err(Error::unimplemented("SSL connections"));
        }
        Ok(())
    }
}
