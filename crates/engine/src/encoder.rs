//! Row encoder
//!
//! Turns one retrieved row into exactly one mutation statement:
//!
//! - Tables with at least one counter column become
//!   `UPDATE "<ks>"."<t>" SET "c" = "c" + v, ... WHERE "k" = v AND ...`.
//!   Counters cannot be written with INSERT; an increment from zero
//!   reproduces the value on an empty target.
//! - Every other table becomes
//!   `INSERT INTO "<ks>"."<t>" ("a", "b") VALUES (1, 'x')`. Null cells are left
//!   out of both lists so they never overwrite anything with a tombstone.
//!
//! Column order is the row's order, so the same row always yields the same
//! text. The returned statement carries no terminator; the statement log
//! writer adds it.

use std::collections::HashSet;

use cqldump_core::{qualified_name, quote_identifier, ColumnSpec, Row};

/// Encode `row` as a statement against `"<keyspace>"."<table>"`.
///
/// `is_counter` reports whether a column name is a counter column. Returns
/// `None` when the row carries nothing to write: every counter cell of a
/// counter row is null, or every cell of a plain row is null. A counter row
/// with a null key cell is also `None`, since it has no WHERE clause to
/// address; in a counter table every non-counter column is a key column.
pub fn encode<F>(row: &Row, is_counter: F, keyspace: &str, table: &str) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let target = qualified_name(keyspace, table);
    let has_counter = row.iter().any(|(name, _)| is_counter(name));

    if has_counter {
        let mut set = Vec::new();
        let mut filter = Vec::new();
        for (name, literal) in row.iter() {
            let Some(literal) = literal else {
                if is_counter(name) {
                    continue;
                }
                return None;
            };
            let quoted = quote_identifier(name);
            if is_counter(name) {
                set.push(format!("{} = {} + {}", quoted, quoted, literal));
            } else {
                filter.push(format!("{} = {}", quoted, literal));
            }
        }
        if set.is_empty() || filter.is_empty() {
            return None;
        }
        Some(format!(
            "UPDATE {} SET {} WHERE {}",
            target,
            set.join(", "),
            filter.join(" AND ")
        ))
    } else {
        let (names, values): (Vec<String>, Vec<&str>) = row
            .iter()
            .filter_map(|(name, literal)| literal.map(|l| (quote_identifier(name), l)))
            .unzip();
        if names.is_empty() {
            return None;
        }
        Some(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            target,
            names.join(", "),
            values.join(", ")
        ))
    }
}

/// Encoder bound to one table, with counter columns known up front.
///
/// The shape is a property of the table: if any column of the result set is
/// a counter, every row becomes an UPDATE.
#[derive(Debug, Clone)]
pub struct RowEncoder {
    keyspace: String,
    table: String,
    counters: HashSet<String>,
}

impl RowEncoder {
    /// Build an encoder from the result-set columns of a table scan
    pub fn new(
        keyspace: impl Into<String>,
        table: impl Into<String>,
        columns: &[ColumnSpec],
    ) -> Self {
        let counters = columns
            .iter()
            .filter(|c| c.column_type.is_counter())
            .map(|c| c.name.clone())
            .collect();
        RowEncoder {
            keyspace: keyspace.into(),
            table: table.into(),
            counters,
        }
    }

    /// Build an encoder from an explicit set of counter column names
    pub fn with_counter_columns<I, S>(
        keyspace: impl Into<String>,
        table: impl Into<String>,
        counters: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RowEncoder {
            keyspace: keyspace.into(),
            table: table.into(),
            counters: counters.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether rows of this table encode as counter UPDATEs
    pub fn is_counter_table(&self) -> bool {
        !self.counters.is_empty()
    }

    /// Encode one row; see [`encode`]
    pub fn encode(&self, row: &Row) -> Option<String> {
        encode(
            row,
            |name| self.counters.contains(name),
            &self.keyspace,
            &self.table,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqldump_core::ColumnType;
    use proptest::prelude::*;

    fn plain() -> RowEncoder {
        RowEncoder::with_counter_columns("ks", "t", Vec::<String>::new())
    }

    #[test]
    fn test_insert_shape() {
        let row = Row::new().with("id", Some("1")).with("name", Some("'x'"));
        assert_eq!(
            plain().encode(&row).unwrap(),
            "INSERT INTO \"ks\".\"t\" (\"id\", \"name\") VALUES (1, 'x')"
        );
    }

    #[test]
    fn test_insert_omits_nulls() {
        let row = Row::new()
            .with("id", Some("1"))
            .with("a", None)
            .with("b", Some("2"));
        assert_eq!(
            plain().encode(&row).unwrap(),
            "INSERT INTO \"ks\".\"t\" (\"id\", \"b\") VALUES (1, 2)"
        );
    }

    #[test]
    fn test_counter_update_shape() {
        let encoder = RowEncoder::with_counter_columns("ks", "t", ["c"]);
        let row = Row::new().with("k", Some("'a'")).with("c", Some("5"));
        assert_eq!(
            encoder.encode(&row).unwrap(),
            "UPDATE \"ks\".\"t\" SET \"c\" = \"c\" + 5 WHERE \"k\" = 'a'"
        );
    }

    #[test]
    fn test_counter_update_multiple_keys_and_counters() {
        let encoder = RowEncoder::with_counter_columns("ks", "t", ["hits", "misses"]);
        let row = Row::new()
            .with("k1", Some("1"))
            .with("hits", Some("3"))
            .with("k2", Some("'b'"))
            .with("misses", Some("-1"));
        assert_eq!(
            encoder.encode(&row).unwrap(),
            "UPDATE \"ks\".\"t\" SET \"hits\" = \"hits\" + 3, \"misses\" = \"misses\" + -1 \
             WHERE \"k1\" = 1 AND \"k2\" = 'b'"
        );
    }

    #[test]
    fn test_null_counter_left_out() {
        let encoder = RowEncoder::with_counter_columns("ks", "t", ["a", "b"]);
        let row = Row::new()
            .with("k", Some("1"))
            .with("a", None)
            .with("b", Some("2"));
        assert_eq!(
            encoder.encode(&row).unwrap(),
            "UPDATE \"ks\".\"t\" SET \"b\" = \"b\" + 2 WHERE \"k\" = 1"
        );

        let all_null = Row::new().with("k", Some("1")).with("a", None).with("b", None);
        assert_eq!(encoder.encode(&all_null), None);
    }

    #[test]
    fn test_counter_row_without_key_skipped() {
        let encoder = RowEncoder::with_counter_columns("ks", "t", ["c"]);
        let null_key = Row::new().with("k", None).with("c", Some("5"));
        assert_eq!(encoder.encode(&null_key), None);

        let no_key = Row::new().with("c", Some("5"));
        assert_eq!(encoder.encode(&no_key), None);
    }

    #[test]
    fn test_identifiers_are_escaped() {
        let row = Row::new().with("Weird\"Name", Some("1"));
        let encoded = encode(&row, |_| false, "My\"Ks", "t").unwrap();
        assert_eq!(
            encoded,
            "INSERT INTO \"My\"\"Ks\".\"t\" (\"Weird\"\"Name\") VALUES (1)"
        );
    }

    #[test]
    fn test_encoder_from_column_specs() {
        let columns = vec![
            ColumnSpec::new("k", ColumnType::Text),
            ColumnSpec::new("c", ColumnType::Counter),
        ];
        let encoder = RowEncoder::new("ks", "t", &columns);
        assert!(encoder.is_counter_table());
        assert!(!RowEncoder::new("ks", "t", &columns[..1]).is_counter_table());
    }

    fn cells() -> impl Strategy<Value = Vec<(bool, Option<u32>)>> {
        proptest::collection::vec((any::<bool>(), proptest::option::of(any::<u32>())), 1..8)
    }

    fn build(cells: &[(bool, Option<u32>)]) -> (Row, Vec<String>) {
        let mut row = Row::new();
        let mut counters = Vec::new();
        for (i, (counter, value)) in cells.iter().enumerate() {
            let name = format!("c{}", i);
            if *counter {
                counters.push(name.clone());
            }
            row.push(name, value.map(|v| v.to_string()));
        }
        (row, counters)
    }

    proptest! {
        #[test]
        fn test_shape_follows_counter_presence(cells in cells()) {
            let (row, counters) = build(&cells);
            let encoder = RowEncoder::with_counter_columns("ks", "t", counters.clone());
            if let Some(statement) = encoder.encode(&row) {
                if counters.is_empty() {
                    prop_assert!(statement.starts_with("INSERT INTO "));
                } else {
                    prop_assert!(statement.starts_with("UPDATE "));
                }
            }
        }

        #[test]
        fn test_insert_lists_are_aligned(values in proptest::collection::vec(proptest::option::of(any::<u32>()), 1..8)) {
            let cells: Vec<(bool, Option<u32>)> = values.iter().map(|v| (false, *v)).collect();
            let (row, _) = build(&cells);
            let non_null = values.iter().filter(|v| v.is_some()).count();
            match plain().encode(&row) {
                None => prop_assert_eq!(non_null, 0),
                Some(statement) => {
                    let open = statement.find(" (").unwrap();
                    let mid = statement.find(") VALUES (").unwrap();
                    let names: Vec<&str> = statement[open + 2..mid].split(", ").collect();
                    let literals: Vec<&str> = statement[mid + 10..statement.len() - 1].split(", ").collect();
                    prop_assert_eq!(names.len(), non_null);
                    prop_assert_eq!(literals.len(), non_null);
                    prop_assert!(!statement.contains("null"));
                    for (name, literal) in names.iter().zip(&literals) {
                        let index: usize = name.trim_matches('"')[1..].parse().unwrap();
                        prop_assert_eq!(values[index].map(|v| v.to_string()).unwrap(), *literal);
                    }
                }
            }
        }
    }
}
