//! Export selection
//!
//! What an export covers: every non-system keyspace, a list of keyspaces, a
//! list of `ks.table` names, or a list of filters. The three lists are
//! mutually exclusive.

use std::fmt;
use std::str::FromStr;

use cqldump_core::{Error, Result};

/// A `keyspace.table` name as given on the command line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Keyspace name
    pub keyspace: String,
    /// Table name
    pub table: String,
}

impl TableRef {
    /// Create a table reference
    pub fn new(keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        TableRef {
            keyspace: keyspace.into(),
            table: table.into(),
        }
    }
}

impl FromStr for TableRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('.') {
            Some((keyspace, table)) if !keyspace.is_empty() && !table.is_empty() => {
                Ok(TableRef::new(keyspace, table))
            }
            _ => Err(Error::configuration(format!(
                "invalid column family name {:?}, expected <keyspace>.<table>",
                s
            ))),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.keyspace, self.table)
    }
}

/// A filter: a table followed by an optional predicate
///
/// The whole text is placed after `SELECT * FROM`, so `ks.t WHERE k = 1`
/// selects the matching rows of `ks.t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    /// Table the filter reads
    pub target: TableRef,
    /// Full filter text, starting with the table name
    pub text: String,
}

impl FromStr for FilterSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let head = text.split_whitespace().next().unwrap_or("");
        Ok(FilterSpec {
            target: head.parse()?,
            text: text.to_string(),
        })
    }
}

/// What to export
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every keyspace except the system ones
    #[default]
    All,
    /// Named keyspaces, whole
    Keyspaces(Vec<String>),
    /// Named tables
    Tables(Vec<TableRef>),
    /// Filtered tables
    Filters(Vec<FilterSpec>),
}

impl Selection {
    /// Build a selection from the three optional lists
    ///
    /// At most one list may be non-empty. Table and filter entries must name
    /// a `keyspace.table`.
    pub fn from_lists(keyspaces: &[String], tables: &[String], filters: &[String]) -> Result<Self> {
        let given = [!keyspaces.is_empty(), !tables.is_empty(), !filters.is_empty()];
        if given.iter().filter(|g| **g).count() > 1 {
            return Err(Error::configuration(
                "--cf, --keyspace and --filter can't be combined",
            ));
        }
        if !keyspaces.is_empty() {
            return Ok(Selection::Keyspaces(keyspaces.to_vec()));
        }
        if !tables.is_empty() {
            let tables = tables
                .iter()
                .map(|t| t.parse())
                .collect::<Result<Vec<TableRef>>>()?;
            return Ok(Selection::Tables(tables));
        }
        if !filters.is_empty() {
            let filters = filters
                .iter()
                .map(|f| f.parse())
                .collect::<Result<Vec<FilterSpec>>>()?;
            return Ok(Selection::Filters(filters));
        }
        Ok(Selection::All)
    }
}
