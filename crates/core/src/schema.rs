//! Schema metadata and DDL rendering
//!
//! The metadata here is what a [`Session`](crate::traits::Session) reports for
//! a keyspace. `as_cql` renders it back as replayable DDL: every statement is
//! terminated by `;` at the end of its last line and no earlier line ends with
//! `;`, so the statement log reader can split it.

use std::collections::{BTreeMap, HashSet};

use crate::column_type::ColumnType;
use crate::cql::{qualified_name, quote_identifier, quote_string};

/// Role of a column within its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKind {
    /// Part of the partition key
    PartitionKey,
    /// Part of the clustering key
    Clustering,
    /// Static column (one value per partition)
    Static,
    /// Regular column
    Regular,
}

impl ColumnKind {
    /// Parse the `system_schema.columns.kind` spelling
    pub fn from_schema(kind: &str) -> Option<Self> {
        match kind {
            "partition_key" => Some(ColumnKind::PartitionKey),
            "clustering" => Some(ColumnKind::Clustering),
            "static" => Some(ColumnKind::Static),
            "regular" => Some(ColumnKind::Regular),
            _ => None,
        }
    }

    /// Whether the column is part of the primary key
    pub fn is_key(&self) -> bool {
        matches!(self, ColumnKind::PartitionKey | ColumnKind::Clustering)
    }
}

/// Clustering order of a clustering column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClusteringOrder {
    /// Not a clustering column
    #[default]
    None,
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl ClusteringOrder {
    /// Parse the `system_schema.columns.clustering_order` spelling
    pub fn from_schema(order: &str) -> Self {
        match order.to_ascii_lowercase().as_str() {
            "asc" => ClusteringOrder::Asc,
            "desc" => ClusteringOrder::Desc,
            _ => ClusteringOrder::None,
        }
    }
}

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Column name, unique within the table
    pub name: String,
    /// Declared type
    pub column_type: ColumnType,
    /// Key role
    pub kind: ColumnKind,
    /// Position within the partition or clustering key (0 for other columns)
    pub position: i32,
    /// Clustering order (clustering columns only)
    pub clustering_order: ClusteringOrder,
}

impl ColumnMetadata {
    /// A regular column
    pub fn regular(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnMetadata {
            name: name.into(),
            column_type,
            kind: ColumnKind::Regular,
            position: 0,
            clustering_order: ClusteringOrder::None,
        }
    }

    /// A partition key column at `position`
    pub fn partition_key(name: impl Into<String>, column_type: ColumnType, position: i32) -> Self {
        ColumnMetadata {
            kind: ColumnKind::PartitionKey,
            position,
            ..ColumnMetadata::regular(name, column_type)
        }
    }

    /// A clustering column at `position`
    pub fn clustering(
        name: impl Into<String>,
        column_type: ColumnType,
        position: i32,
        order: ClusteringOrder,
    ) -> Self {
        ColumnMetadata {
            kind: ColumnKind::Clustering,
            position,
            clustering_order: order,
            ..ColumnMetadata::regular(name, column_type)
        }
    }

    /// A static column
    pub fn static_column(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnMetadata {
            kind: ColumnKind::Static,
            ..ColumnMetadata::regular(name, column_type)
        }
    }

    /// Whether the column type is `counter`
    pub fn is_counter(&self) -> bool {
        self.column_type.is_counter()
    }
}

/// Flavor of a secondary index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKind {
    /// Regular secondary index
    Composites,
    /// Legacy thrift KEYS index
    Keys,
    /// Custom index implemented by `class_name`
    Custom {
        /// Implementing class
        class_name: String,
    },
}

/// A secondary index on a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMetadata {
    /// Index name
    pub name: String,
    /// Target expression as stored, e.g. `name` or `keys(attrs)`
    pub target: String,
    /// Index flavor
    pub kind: IndexKind,
}

/// A table ("column family")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    /// Owning keyspace
    pub keyspace: String,
    /// Table name
    pub name: String,
    /// Columns in declaration order: partition key, clustering, then the rest
    pub columns: Vec<ColumnMetadata>,
    /// Table options as `name -> CQL literal`, rendered after `WITH`
    pub options: BTreeMap<String, String>,
    /// Secondary indexes
    pub indexes: Vec<IndexMetadata>,
}

impl TableMetadata {
    /// Create a table with no columns
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        TableMetadata {
            keyspace: keyspace.into(),
            name: name.into(),
            columns: Vec::new(),
            options: BTreeMap::new(),
            indexes: Vec::new(),
        }
    }

    /// Add a column (builder pattern). Columns are re-sorted on every add.
    pub fn with_column(mut self, column: ColumnMetadata) -> Self {
        self.add_column(column);
        self
    }

    /// Add a column, keeping declaration order
    pub fn add_column(&mut self, column: ColumnMetadata) {
        self.columns.push(column);
        self.sort_columns();
    }

    /// Put columns in the order `SELECT *` returns them: partition key and
    /// clustering columns by position, then static and regular columns by name.
    pub fn sort_columns(&mut self) {
        self.columns.sort_by(|a, b| {
            let rank = |c: &ColumnMetadata| match c.kind {
                ColumnKind::PartitionKey => 0,
                ColumnKind::Clustering => 1,
                ColumnKind::Static | ColumnKind::Regular => 2,
            };
            rank(a)
                .cmp(&rank(b))
                .then_with(|| {
                    if a.kind.is_key() {
                        a.position.cmp(&b.position)
                    } else {
                        a.name.cmp(&b.name)
                    }
                })
        });
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Partition key columns, by position
    pub fn partition_key(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::PartitionKey)
    }

    /// Clustering columns, by position
    pub fn clustering_columns(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter().filter(|c| c.kind == ColumnKind::Clustering)
    }

    /// Names of the counter columns
    pub fn counter_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_counter())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Whether any column is a counter
    pub fn is_counter_table(&self) -> bool {
        self.columns.iter().any(|c| c.is_counter())
    }

    /// `CREATE TABLE` followed by one `CREATE INDEX` per index
    pub fn as_cql(&self) -> String {
        let mut out = self.create_table_cql();
        for index in &self.indexes {
            out.push('\n');
            out.push_str(&self.create_index_cql(index));
        }
        out
    }

    fn create_table_cql(&self) -> String {
        let mut out = format!(
            "CREATE TABLE {} (\n",
            qualified_name(&self.keyspace, &self.name)
        );
        for column in &self.columns {
            out.push_str("    ");
            out.push_str(&quote_identifier(&column.name));
            out.push(' ');
            out.push_str(&column.column_type.to_string());
            if column.kind == ColumnKind::Static {
                out.push_str(" static");
            }
            out.push_str(",\n");
        }
        out.push_str("    PRIMARY KEY (");
        let partition: Vec<String> = self
            .partition_key()
            .map(|c| quote_identifier(&c.name))
            .collect();
        if partition.len() == 1 {
            out.push_str(&partition[0]);
        } else {
            out.push('(');
            out.push_str(&partition.join(", "));
            out.push(')');
        }
        for c in self.clustering_columns() {
            out.push_str(", ");
            out.push_str(&quote_identifier(&c.name));
        }
        out.push_str(")\n)");

        let mut clauses = Vec::new();
        let ordering: Vec<String> = self
            .clustering_columns()
            .map(|c| {
                let dir = if c.clustering_order == ClusteringOrder::Desc {
                    "DESC"
                } else {
                    "ASC"
                };
                format!("{} {}", quote_identifier(&c.name), dir)
            })
            .collect();
        if self
            .clustering_columns()
            .any(|c| c.clustering_order == ClusteringOrder::Desc)
        {
            clauses.push(format!("CLUSTERING ORDER BY ({})", ordering.join(", ")));
        }
        for (name, literal) in &self.options {
            clauses.push(format!("{} = {}", name, literal));
        }
        if !clauses.is_empty() {
            out.push_str(" WITH ");
            out.push_str(&clauses.join("\n    AND "));
        }
        out.push(';');
        out
    }

    fn create_index_cql(&self, index: &IndexMetadata) -> String {
        let table = qualified_name(&self.keyspace, &self.name);
        match &index.kind {
            IndexKind::Custom { class_name } => format!(
                "CREATE CUSTOM INDEX {} ON {} ({}) USING {};",
                quote_identifier(&index.name),
                table,
                index.target,
                quote_string(class_name)
            ),
            IndexKind::Composites | IndexKind::Keys => format!(
                "CREATE INDEX {} ON {} ({});",
                quote_identifier(&index.name),
                table,
                index.target
            ),
        }
    }
}

/// A user-defined type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserType {
    /// Owning keyspace
    pub keyspace: String,
    /// Type name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<(String, ColumnType)>,
}

impl UserType {
    /// `CREATE TYPE` statement
    pub fn as_cql(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(name, t)| format!("    {} {}", quote_identifier(name), t))
            .collect();
        format!(
            "CREATE TYPE {} (\n{}\n);",
            qualified_name(&self.keyspace, &self.name),
            fields.join(",\n")
        )
    }
}

fn collect_udt_names<'a>(t: &'a ColumnType, out: &mut Vec<&'a str>) {
    match t {
        ColumnType::UserDefined { name, .. } => out.push(name),
        ColumnType::List(inner) | ColumnType::Set(inner) | ColumnType::Frozen(inner) => {
            collect_udt_names(inner, out)
        }
        ColumnType::Map(k, v) => {
            collect_udt_names(k, out);
            collect_udt_names(v, out);
        }
        ColumnType::Tuple(items) => items.iter().for_each(|i| collect_udt_names(i, out)),
        _ => {}
    }
}

/// A keyspace with everything it contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyspaceMetadata {
    /// Keyspace name
    pub name: String,
    /// Replication options, e.g. `class -> SimpleStrategy`
    pub replication: BTreeMap<String, String>,
    /// Whether commit log writes are enabled
    pub durable_writes: bool,
    /// User-defined types
    pub user_types: Vec<UserType>,
    /// Tables, sorted by name
    pub tables: Vec<TableMetadata>,
}

impl KeyspaceMetadata {
    /// A keyspace with `SimpleStrategy` replication
    pub fn simple(name: impl Into<String>, replication_factor: u32) -> Self {
        let mut replication = BTreeMap::new();
        replication.insert(
            "class".to_string(),
            "org.apache.cassandra.locator.SimpleStrategy".to_string(),
        );
        replication.insert(
            "replication_factor".to_string(),
            replication_factor.to_string(),
        );
        KeyspaceMetadata {
            name: name.into(),
            replication,
            durable_writes: true,
            user_types: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Add a table, keeping tables sorted by name
    pub fn add_table(&mut self, table: TableMetadata) {
        self.tables.retain(|t| t.name != table.name);
        self.tables.push(table);
        self.tables.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// `CREATE KEYSPACE` only
    pub fn create_keyspace_cql(&self) -> String {
        let replication: Vec<String> = self
            .replication
            .iter()
            .map(|(k, v)| format!("{}: {}", quote_string(k), quote_string(v)))
            .collect();
        format!(
            "CREATE KEYSPACE {} WITH replication = {{{}}} AND durable_writes = {};",
            quote_identifier(&self.name),
            replication.join(", "),
            self.durable_writes
        )
    }

    /// User types in an order where every type follows the types it uses
    pub fn user_types_in_dependency_order(&self) -> Vec<&UserType> {
        let mut emitted: HashSet<&str> = HashSet::new();
        let mut ordered = Vec::with_capacity(self.user_types.len());
        let mut remaining: Vec<&UserType> = self.user_types.iter().collect();
        while !remaining.is_empty() {
            let before = remaining.len();
            remaining.retain(|ut| {
                let ut: &UserType = *ut;
                let mut deps: Vec<&str> = Vec::new();
                for (_, t) in &ut.fields {
                    collect_udt_names(t, &mut deps);
                }
                let ready = deps
                    .iter()
                    .filter(|d| self.user_types.iter().any(|u| u.name == **d))
                    .all(|d| emitted.contains(*d));
                if ready {
                    emitted.insert(ut.name.as_str());
                    ordered.push(ut);
                    false
                } else {
                    true
                }
            });
            if remaining.len() == before {
                // cyclic or dangling references: keep declaration order
                ordered.extend(remaining.drain(..));
            }
        }
        ordered
    }

    /// Full keyspace DDL: keyspace, types, tables and their indexes,
    /// separated by blank lines
    pub fn as_cql(&self) -> String {
        let mut parts = vec![self.create_keyspace_cql()];
        for ut in self.user_types_in_dependency_order() {
            parts.push(ut.as_cql());
        }
        for table in &self.tables {
            parts.push(table.as_cql());
        }
        parts.join("\n\n")
    }
}
