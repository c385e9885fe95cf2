//! Native protocol [`Session`]
//!
//! Statements run one at a time on a single connection. Queries are paged:
//! the first page is fetched when the cursor is created, later pages as the
//! cursor runs dry.
//!
//! Keyspace metadata is read from the `system_schema` tables at `ONE`.
//! Materialized views are not loaded.

use std::collections::{BTreeMap, VecDeque};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::str::FromStr;

use cqldump_core::{
    quote_string, ClusteringOrder, ColumnKind, ColumnMetadata, ColumnSpec, ColumnType,
    ConsistencyLevel, CqlValue, Error, IndexKind, IndexMetadata, KeyspaceMetadata, Result,
    RowCursor, Session, TableMetadata, UserType,
};
use tracing::debug;

use crate::connection::Connection;
use crate::options::ConnectOptions;
use crate::response::{QueryResult, RowsPage};

/// `system_schema.tables` columns that are not table options
const NON_OPTION_COLUMNS: [&str; 5] = ["keyspace_name", "table_name", "id", "flags", "extensions"];

type Record = BTreeMap<String, CqlValue>;

/// Session over one native protocol connection
pub struct NativeSession<T: Read + Write = TcpStream> {
    connection: Connection<T>,
    page_size: i32,
}

impl NativeSession<TcpStream> {
    /// Validate `options`, connect and authenticate
    pub fn connect(options: &ConnectOptions) -> Result<Self> {
        options.validate()?;
        let connection = Connection::open(options)?;
        Ok(NativeSession::new(connection, options.page_size))
    }
}

impl<T: Read + Write> NativeSession<T> {
    /// Wrap a handshaken connection
    pub fn new(connection: Connection<T>, page_size: i32) -> Self {
        NativeSession {
            connection,
            page_size,
        }
    }

    fn page(
        &mut self,
        query: &str,
        consistency: ConsistencyLevel,
        paging_state: Option<&[u8]>,
    ) -> Result<RowsPage> {
        let result = self
            .connection
            .query(query, consistency, Some(self.page_size), paging_state)
            .map_err(|e| in_statement(query, e))?;
        match result {
            QueryResult::Rows(page) => Ok(page),
            other => Err(Error::Protocol(format!(
                "expected rows for `{}`, got {:?}",
                query, other
            ))),
        }
    }

    /// Every row of a schema query, as name-keyed records
    fn records(&mut self, query: &str) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut paging_state: Option<Vec<u8>> = None;
        loop {
            let page = self.page(query, ConsistencyLevel::One, paging_state.as_deref())?;
            for row in page.rows {
                records.push(
                    page.columns
                        .iter()
                        .map(|c| c.name.clone())
                        .zip(row)
                        .collect(),
                );
            }
            match page.paging_state {
                Some(state) => paging_state = Some(state),
                None => return Ok(records),
            }
        }
    }

    fn load_keyspace(&mut self, name: &str) -> Result<Option<KeyspaceMetadata>> {
        let filter = format!("WHERE keyspace_name = {}", quote_string(name));
        let rows = self.records(&format!(
            "SELECT keyspace_name, durable_writes, replication FROM system_schema.keyspaces {}",
            filter
        ))?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let mut keyspace = KeyspaceMetadata {
            name: name.to_string(),
            replication: text_map(row.get("replication")),
            durable_writes: !matches!(row.get("durable_writes"), Some(CqlValue::Boolean(false))),
            user_types: Vec::new(),
            tables: Vec::new(),
        };

        for row in self.records(&format!(
            "SELECT type_name, field_names, field_types FROM system_schema.types {}",
            filter
        ))? {
            let names = text_list(row.get("field_names"));
            let types = text_list(row.get("field_types"))
                .iter()
                .map(|t| parse_type(t))
                .collect::<Result<Vec<_>>>()?;
            keyspace.user_types.push(UserType {
                keyspace: name.to_string(),
                name: text(&row, "type_name")?,
                fields: names.into_iter().zip(types).collect(),
            });
        }

        let mut tables: BTreeMap<String, TableMetadata> = BTreeMap::new();
        for row in self.records(&format!("SELECT * FROM system_schema.tables {}", filter))? {
            let table_name = text(&row, "table_name")?;
            let mut table = TableMetadata::new(name, table_name.as_str());
            for (option, value) in &row {
                if NON_OPTION_COLUMNS.contains(&option.as_str()) {
                    continue;
                }
                if let Some(literal) = value.to_cql_literal() {
                    table.options.insert(option.clone(), literal);
                }
            }
            tables.insert(table_name, table);
        }

        for row in self.records(&format!(
            "SELECT table_name, column_name, clustering_order, kind, position, type FROM system_schema.columns {}",
            filter
        ))? {
            // columns of views have no entry in `tables`
            let Some(table) = tables.get_mut(&text(&row, "table_name")?) else {
                continue;
            };
            let kind_text = text(&row, "kind")?;
            let kind = ColumnKind::from_schema(&kind_text)
                .ok_or_else(|| Error::Protocol(format!("unknown column kind {}", kind_text)))?;
            let position = match row.get("position") {
                Some(CqlValue::Int(p)) => *p,
                _ => -1,
            };
            table.add_column(ColumnMetadata {
                name: text(&row, "column_name")?,
                column_type: parse_type(&text(&row, "type")?)?,
                kind,
                position,
                clustering_order: ClusteringOrder::from_schema(
                    &text(&row, "clustering_order").unwrap_or_default(),
                ),
            });
        }

        for row in self.records(&format!(
            "SELECT table_name, index_name, kind, options FROM system_schema.indexes {}",
            filter
        ))? {
            let Some(table) = tables.get_mut(&text(&row, "table_name")?) else {
                continue;
            };
            let mut options = text_map(row.get("options"));
            let kind = match text(&row, "kind")?.as_str() {
                "CUSTOM" => IndexKind::Custom {
                    class_name: options.remove("class_name").unwrap_or_default(),
                },
                "KEYS" => IndexKind::Keys,
                _ => IndexKind::Composites,
            };
            table.indexes.push(IndexMetadata {
                name: text(&row, "index_name")?,
                target: options.remove("target").unwrap_or_default(),
                kind,
            });
        }

        for table in tables.into_values() {
            keyspace.add_table(table);
        }
        debug!(
            keyspace = name,
            tables = keyspace.tables.len(),
            types = keyspace.user_types.len(),
            "Loaded keyspace metadata"
        );
        Ok(Some(keyspace))
    }
}

impl<T: Read + Write> Session for NativeSession<T> {
    fn keyspace_names(&mut self) -> Result<Vec<String>> {
        let mut names = self
            .records("SELECT keyspace_name FROM system_schema.keyspaces")?
            .iter()
            .map(|row| text(row, "keyspace_name"))
            .collect::<Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    fn keyspace(&mut self, name: &str) -> Result<Option<KeyspaceMetadata>> {
        self.load_keyspace(name)
    }

    fn execute(&mut self, statement: &str, consistency: ConsistencyLevel) -> Result<()> {
        self.connection
            .query(statement, consistency, None, None)
            .map_err(|e| in_statement(statement, e))?;
        Ok(())
    }

    fn query(
        &mut self,
        query: &str,
        consistency: ConsistencyLevel,
    ) -> Result<Box<dyn RowCursor + '_>> {
        let first = self.page(query, consistency, None)?;
        Ok(Box::new(NativeCursor {
            session: self,
            query: query.to_string(),
            consistency,
            columns: first.columns,
            rows: first.rows.into(),
            paging_state: first.paging_state,
        }))
    }
}

/// Forward-only cursor fetching one page at a time
struct NativeCursor<'s, T: Read + Write> {
    session: &'s mut NativeSession<T>,
    query: String,
    consistency: ConsistencyLevel,
    columns: Vec<ColumnSpec>,
    rows: VecDeque<Vec<CqlValue>>,
    paging_state: Option<Vec<u8>>,
}

impl<T: Read + Write> RowCursor for NativeCursor<'_, T> {
    fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<CqlValue>>> {
        loop {
            if let Some(row) = self.rows.pop_front() {
                return Ok(Some(row));
            }
            let Some(state) = self.paging_state.take() else {
                return Ok(None);
            };
            let page = self
                .session
                .page(&self.query, self.consistency, Some(state.as_slice()))?;
            self.rows = page.rows.into();
            self.paging_state = page.paging_state;
        }
    }
}

/// Server errors on a statement become execution errors naming it
fn in_statement(statement: &str, error: Error) -> Error {
    match error {
        Error::Server { code, message } => {
            Error::execution(statement, format!("{} (error 0x{:04x})", message, code))
        }
        other => other,
    }
}

fn parse_type(text: &str) -> Result<ColumnType> {
    ColumnType::from_str(text).map_err(|e| Error::Protocol(e.to_string()))
}

fn text(row: &Record, column: &str) -> Result<String> {
    match row.get(column) {
        Some(CqlValue::Text(s)) | Some(CqlValue::Ascii(s)) => Ok(s.clone()),
        other => Err(Error::Protocol(format!(
            "expected text in schema column {}, got {:?}",
            column, other
        ))),
    }
}

fn text_of(value: &CqlValue) -> Option<String> {
    match value {
        CqlValue::Text(s) | CqlValue::Ascii(s) => Some(s.clone()),
        _ => None,
    }
}

fn text_map(value: Option<&CqlValue>) -> BTreeMap<String, String> {
    match value {
        Some(CqlValue::Map(entries)) => entries
            .iter()
            .filter_map(|(k, v)| Some((text_of(k)?, text_of(v)?)))
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn text_list(value: Option<&CqlValue>) -> Vec<String> {
    match value {
        Some(CqlValue::List(items)) => items.iter().filter_map(text_of).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{BodyReader, BodyWriter};
    use crate::connection::tests::Scripted;
    use crate::frame::{Frame, Opcode};
    use crate::response::fixtures::{error, response, text_rows, void};

    const TEXT: &[u16] = &[0x000D];
    const INT: &[u16] = &[0x0009];
    const BOOLEAN: &[u16] = &[0x0004];
    const TEXT_MAP: &[u16] = &[0x0021, 0x000D, 0x000D];
    const TEXT_LIST: &[u16] = &[0x0020, 0x000D];

    enum Cell<'a> {
        Text(&'a str),
        Int(i32),
        Bool(bool),
        Map(&'a [(&'a str, &'a str)]),
        List(&'a [&'a str]),
        Null,
    }

    fn encode(cell: &Cell<'_>) -> Option<Vec<u8>> {
        let mut body = BodyWriter::new();
        match cell {
            Cell::Text(s) => return Some(s.as_bytes().to_vec()),
            Cell::Int(i) => {
                body.int(*i);
            }
            Cell::Bool(b) => {
                body.byte(u8::from(*b));
            }
            Cell::Map(entries) => {
                body.int(entries.len() as i32);
                for (k, v) in entries.iter() {
                    body.bytes(Some(k.as_bytes())).bytes(Some(v.as_bytes()));
                }
            }
            Cell::List(items) => {
                body.int(items.len() as i32);
                for item in items.iter() {
                    body.bytes(Some(item.as_bytes()));
                }
            }
            Cell::Null => return None,
        }
        Some(body.into_bytes())
    }

    fn rows(stream: i16, columns: &[(&str, &[u16])], rows: &[Vec<Cell<'_>>]) -> Frame {
        let mut body = BodyWriter::new();
        body.int(0x0002).int(0x0001).int(columns.len() as i32);
        body.string("system_schema").string("t");
        for (name, type_ids) in columns {
            body.string(name);
            for id in type_ids.iter() {
                body.short(*id);
            }
        }
        body.int(rows.len() as i32);
        for row in rows {
            for cell in row {
                body.bytes(encode(cell).as_deref());
            }
        }
        response(stream, Opcode::Result, body.into_bytes())
    }

    fn session(frames: Vec<Frame>) -> NativeSession<Scripted> {
        NativeSession::new(Connection::new(Scripted::new(frames)), 100)
    }

    #[test]
    fn test_missing_keyspace() {
        let mut session = session(vec![rows(
            1,
            &[("keyspace_name", TEXT), ("durable_writes", BOOLEAN), ("replication", TEXT_MAP)],
            &[],
        )]);
        assert_eq!(session.keyspace("nope").unwrap(), None);
    }

    #[test]
    fn test_load_keyspace() {
        let frames = vec![
            rows(
                1,
                &[("keyspace_name", TEXT), ("durable_writes", BOOLEAN), ("replication", TEXT_MAP)],
                &[vec![
                    Cell::Text("ks"),
                    Cell::Bool(true),
                    Cell::Map(&[
                        ("class", "org.apache.cassandra.locator.SimpleStrategy"),
                        ("replication_factor", "1"),
                    ]),
                ]],
            ),
            rows(
                2,
                &[("type_name", TEXT), ("field_names", TEXT_LIST), ("field_types", TEXT_LIST)],
                &[vec![Cell::Text("point"), Cell::List(&["x", "y"]), Cell::List(&["int", "int"])]],
            ),
            rows(
                3,
                &[("keyspace_name", TEXT), ("table_name", TEXT), ("comment", TEXT), ("id", TEXT)],
                &[vec![Cell::Text("ks"), Cell::Text("users"), Cell::Text("people"), Cell::Null]],
            ),
            rows(
                4,
                &[
                    ("table_name", TEXT),
                    ("column_name", TEXT),
                    ("clustering_order", TEXT),
                    ("kind", TEXT),
                    ("position", INT),
                    ("type", TEXT),
                ],
                &[
                    vec![
                        Cell::Text("users"),
                        Cell::Text("name"),
                        Cell::Text("none"),
                        Cell::Text("regular"),
                        Cell::Int(-1),
                        Cell::Text("text"),
                    ],
                    vec![
                        Cell::Text("users"),
                        Cell::Text("id"),
                        Cell::Text("none"),
                        Cell::Text("partition_key"),
                        Cell::Int(0),
                        Cell::Text("int"),
                    ],
                    vec![
                        Cell::Text("by_name"),
                        Cell::Text("id"),
                        Cell::Text("none"),
                        Cell::Text("partition_key"),
                        Cell::Int(0),
                        Cell::Text("int"),
                    ],
                ],
            ),
            rows(
                5,
                &[("table_name", TEXT), ("index_name", TEXT), ("kind", TEXT), ("options", TEXT_MAP)],
                &[vec![
                    Cell::Text("users"),
                    Cell::Text("users_name_idx"),
                    Cell::Text("COMPOSITES"),
                    Cell::Map(&[("target", "name")]),
                ]],
            ),
        ];
        let mut session = session(frames);
        let keyspace = session.keyspace("ks").unwrap().unwrap();

        assert_eq!(keyspace.user_types[0].fields[1], ("y".to_string(), ColumnType::Int));
        assert_eq!(keyspace.tables.len(), 1);
        let table = &keyspace.tables[0];
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(table.options.get("comment").map(String::as_str), Some("'people'"));
        assert!(!table.options.contains_key("id"));

        let cql = keyspace.as_cql();
        assert!(cql.contains("CREATE TABLE \"ks\".\"users\""));
        assert!(cql.contains("CREATE INDEX \"users_name_idx\" ON \"ks\".\"users\" (name);"));
    }

    #[test]
    fn test_keyspace_names_sorted() {
        let columns: &[(&str, &[u16])] = &[("keyspace_name", TEXT)];
        let mut session = session(vec![rows(
            1,
            columns,
            &[vec![Cell::Text("system")], vec![Cell::Text("app")]],
        )]);
        assert_eq!(session.keyspace_names().unwrap(), vec!["app", "system"]);
    }

    #[test]
    fn test_cursor_follows_pages() {
        let mut session = session(vec![
            response(1, Opcode::Result, text_rows(&["a", "b"], Some(&b"page2"[..]))),
            response(2, Opcode::Result, text_rows(&["c"], None)),
        ]);
        let mut seen = Vec::new();
        {
            let mut cursor = session.query("SELECT * FROM ks.t", ConsistencyLevel::One).unwrap();
            while let Some(row) = cursor.next_row().unwrap() {
                seen.push(row[0].clone());
            }
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2], CqlValue::Text("c".to_string()));

        let requests = session.connection_requests();
        let mut body = BodyReader::new(&requests[1].body);
        body.long_string().unwrap();
        body.short().unwrap();
        assert_eq!(body.byte().unwrap(), 0x0C);
        assert_eq!(body.int().unwrap(), 100);
        assert_eq!(body.bytes().unwrap(), Some(&b"page2"[..]));
    }

    #[test]
    fn test_execute_error_names_statement() {
        let mut session = session(vec![response(1, Opcode::Error, error(0x2200, "unconfigured table x"))]);
        let err = session
            .execute("INSERT INTO ks.x (a) VALUES (1)", ConsistencyLevel::One)
            .unwrap_err();
        match err {
            Error::Execution { statement, reason } => {
                assert_eq!(statement, "INSERT INTO ks.x (a) VALUES (1)");
                assert!(reason.contains("unconfigured table x"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_execute_void() {
        let mut session = session(vec![response(1, Opcode::Result, void())]);
        session
            .execute("DROP KEYSPACE IF EXISTS \"ks\"", ConsistencyLevel::All)
            .unwrap();
    }

    impl NativeSession<Scripted> {
        fn connection_requests(&self) -> Vec<Frame> {
            self.connection.transport().requests()
        }
    }
}
