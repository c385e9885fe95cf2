//! Consistency levels
//!
//! Only equality matters to the replayer: a directive naming the level that is
//! already active is a no-op. The wire code is the value used by the CQL
//! native protocol.

use std::fmt;
use std::str::FromStr;

/// Replication-acknowledgment policy applied per statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConsistencyLevel {
    /// A write must be written to at least one node, hints included
    Any,
    /// One replica
    #[default]
    One,
    /// Two replicas
    Two,
    /// Three replicas
    Three,
    /// A quorum of replicas across all datacenters
    Quorum,
    /// Every replica
    All,
    /// A quorum in the local datacenter
    LocalQuorum,
    /// A quorum in each datacenter
    EachQuorum,
    /// Linearizable, across datacenters
    Serial,
    /// Linearizable, local datacenter
    LocalSerial,
    /// One replica in the local datacenter
    LocalOne,
}

impl ConsistencyLevel {
    /// Every level, in wire-code order
    pub const ALL_LEVELS: [ConsistencyLevel; 11] = [
        ConsistencyLevel::Any,
        ConsistencyLevel::One,
        ConsistencyLevel::Two,
        ConsistencyLevel::Three,
        ConsistencyLevel::Quorum,
        ConsistencyLevel::All,
        ConsistencyLevel::LocalQuorum,
        ConsistencyLevel::EachQuorum,
        ConsistencyLevel::Serial,
        ConsistencyLevel::LocalSerial,
        ConsistencyLevel::LocalOne,
    ];

    /// Name as written in `CONSISTENCY <LEVEL>;` directives
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyLevel::Any => "ANY",
            ConsistencyLevel::One => "ONE",
            ConsistencyLevel::Two => "TWO",
            ConsistencyLevel::Three => "THREE",
            ConsistencyLevel::Quorum => "QUORUM",
            ConsistencyLevel::All => "ALL",
            ConsistencyLevel::LocalQuorum => "LOCAL_QUORUM",
            ConsistencyLevel::EachQuorum => "EACH_QUORUM",
            ConsistencyLevel::Serial => "SERIAL",
            ConsistencyLevel::LocalSerial => "LOCAL_SERIAL",
            ConsistencyLevel::LocalOne => "LOCAL_ONE",
        }
    }

    /// Native protocol `[consistency]` short
    pub fn code(&self) -> u16 {
        match self {
            ConsistencyLevel::Any => 0x0000,
            ConsistencyLevel::One => 0x0001,
            ConsistencyLevel::Two => 0x0002,
            ConsistencyLevel::Three => 0x0003,
            ConsistencyLevel::Quorum => 0x0004,
            ConsistencyLevel::All => 0x0005,
            ConsistencyLevel::LocalQuorum => 0x0006,
            ConsistencyLevel::EachQuorum => 0x0007,
            ConsistencyLevel::Serial => 0x0008,
            ConsistencyLevel::LocalSerial => 0x0009,
            ConsistencyLevel::LocalOne => 0x000A,
        }
    }

    /// Inverse of [`ConsistencyLevel::code`]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL_LEVELS.iter().copied().find(|l| l.code() == code)
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a level name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown consistency level '{0}'")]
pub struct UnknownConsistencyLevel(pub String);

impl FromStr for ConsistencyLevel {
    type Err = UnknownConsistencyLevel;

    /// Level names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL_LEVELS
            .iter()
            .copied()
            .find(|l| l.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownConsistencyLevel(trimmed.to_string()))
    }
}
