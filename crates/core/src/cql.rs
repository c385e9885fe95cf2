//! CQL text helpers shared by the DDL renderer, the encoder and the codec.

/// Double-quote an identifier, doubling embedded quotes.
///
/// Quoted identifiers are case-sensitive in CQL, so the result always names
/// exactly `name`.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a string literal, doubling embedded quotes.
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `"<keyspace>"."<table>"`
pub fn qualified_name(keyspace: &str, table: &str) -> String {
    format!("{}.{}", quote_identifier(keyspace), quote_identifier(table))
}
