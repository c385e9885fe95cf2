//! Result-set column specs and codec-encoded rows

use crate::column_type::ColumnType;
use crate::value::CqlValue;

/// Name and type of one result-set column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,
    /// Column type
    pub column_type: ColumnType,
}

impl ColumnSpec {
    /// Create a column spec
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnSpec {
            name: name.into(),
            column_type,
        }
    }
}

/// One row as ordered `(column name, literal text or null)` pairs.
///
/// Order is the result-set column order and is what makes generated
/// statement text deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, Option<String>)>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Row::default()
    }

    /// Encode a cursor row through the value codec
    pub fn from_values(columns: &[ColumnSpec], values: &[CqlValue]) -> Self {
        let cells = columns
            .iter()
            .zip(values)
            .map(|(spec, value)| (spec.name.clone(), value.to_cql_literal()))
            .collect();
        Row { cells }
    }

    /// Append a cell (builder pattern)
    pub fn with(mut self, name: impl Into<String>, literal: Option<&str>) -> Self {
        self.push(name, literal.map(str::to_string));
        self
    }

    /// Append a cell
    pub fn push(&mut self, name: impl Into<String>, literal: Option<String>) {
        self.cells.push((name.into(), literal));
    }

    /// Cells in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.cells
            .iter()
            .map(|(name, literal)| (name.as_str(), literal.as_deref()))
    }

    /// Literal of the named cell; `None` if absent, `Some(None)` if null
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.cells
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, literal)| literal.as_deref())
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
