//! In-process cluster
//!
//! `MemoryCluster` holds keyspaces, tables and rows behind a shared lock and
//! hands out [`MemorySession`]s implementing [`Session`]. It interprets the
//! CQL the exporter writes, so a dump can be replayed into a fresh cluster and
//! compared with its source.
//!
//! Rows are kept per primary key, ordered by the literal text of the key
//! values. Every executed statement is recorded with its consistency level.

use std::collections::BTreeMap;
use std::sync::Arc;

use cqldump_core::{
    ColumnSpec, ConsistencyLevel, CqlValue, Error, KeyspaceMetadata, Result, RowCursor, Session,
    TableMetadata, UserType,
};
use parking_lot::Mutex;

use super::cql::{self, Assignment, Literal, Statement};
use super::literal::to_value;

type Cells = BTreeMap<String, CqlValue>;

#[derive(Debug)]
struct KeyspaceData {
    metadata: KeyspaceMetadata,
    rows: BTreeMap<String, BTreeMap<Vec<String>, Cells>>,
}

#[derive(Debug, Default)]
struct ClusterState {
    keyspaces: BTreeMap<String, KeyspaceData>,
    executed: Vec<(String, ConsistencyLevel)>,
    queries: Vec<(String, ConsistencyLevel)>,
    fail_on: Vec<String>,
    open_sessions: usize,
}

/// Shared in-memory cluster
#[derive(Debug, Clone, Default)]
pub struct MemoryCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl MemoryCluster {
    /// Cluster holding only the `system` and `system_traces` keyspaces
    pub fn new() -> Self {
        let cluster = MemoryCluster::empty();
        let bootstrap = [
            "CREATE KEYSPACE system WITH replication = {'class': 'LocalStrategy'}",
            "CREATE TABLE system.local (key text PRIMARY KEY, cluster_name text)",
            "INSERT INTO system.local (key, cluster_name) VALUES ('local', 'memory')",
            "CREATE KEYSPACE system_traces WITH replication = {'class': 'SimpleStrategy', 'replication_factor': '2'}",
            "CREATE TABLE system_traces.sessions (session_id uuid PRIMARY KEY, request text)",
        ];
        {
            let mut state = cluster.state.lock();
            for statement in bootstrap {
                if let Err(e) = apply(&mut state, statement) {
                    panic!("bootstrap statement failed: {}", e);
                }
            }
        }
        cluster
    }

    /// Cluster with no keyspaces at all
    pub fn empty() -> Self {
        MemoryCluster::default()
    }

    /// Open a session
    pub fn session(&self) -> MemorySession {
        self.state.lock().open_sessions += 1;
        MemorySession {
            state: Arc::clone(&self.state),
        }
    }

    /// Execute a statement outside any session, at `ONE`; panics on failure
    pub fn run(&self, statement: &str) {
        if let Err(e) = self.session().execute(statement, ConsistencyLevel::One) {
            panic!("{}: {}", statement, e);
        }
    }

    /// Statements executed so far, with the level each ran at
    pub fn executed(&self) -> Vec<(String, ConsistencyLevel)> {
        self.state.lock().executed.clone()
    }

    /// Queries run so far, with the level each ran at
    pub fn queries(&self) -> Vec<(String, ConsistencyLevel)> {
        self.state.lock().queries.clone()
    }

    /// Forget recorded statements and queries
    pub fn clear_history(&self) {
        let mut state = self.state.lock();
        state.executed.clear();
        state.queries.clear();
    }

    /// Make every statement containing `needle` fail
    pub fn fail_statements_containing(&self, needle: &str) {
        self.state.lock().fail_on.push(needle.to_string());
    }

    /// Sessions opened and not yet dropped
    pub fn open_sessions(&self) -> usize {
        self.state.lock().open_sessions
    }

    /// Metadata of a keyspace
    pub fn keyspace_metadata(&self, keyspace: &str) -> Option<KeyspaceMetadata> {
        self.state
            .lock()
            .keyspaces
            .get(keyspace)
            .map(|k| k.metadata.clone())
    }

    /// Rows of a table in key order, `None` if the table does not exist
    pub fn rows(&self, keyspace: &str, table: &str) -> Option<Vec<BTreeMap<String, CqlValue>>> {
        let state = self.state.lock();
        let rows = state.keyspaces.get(keyspace)?.rows.get(table)?;
        Some(rows.values().cloned().collect())
    }
}

/// Session on a [`MemoryCluster`]
#[derive(Debug)]
pub struct MemorySession {
    state: Arc<Mutex<ClusterState>>,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.open_sessions = state.open_sessions.saturating_sub(1);
    }
}

impl Session for MemorySession {
    fn keyspace_names(&mut self) -> Result<Vec<String>> {
        Ok(self.state.lock().keyspaces.keys().cloned().collect())
    }

    fn keyspace(&mut self, name: &str) -> Result<Option<KeyspaceMetadata>> {
        Ok(self
            .state
            .lock()
            .keyspaces
            .get(name)
            .map(|k| k.metadata.clone()))
    }

    fn execute(&mut self, statement: &str, consistency: ConsistencyLevel) -> Result<()> {
        let mut state = self.state.lock();
        check_injected(&state, statement)?;
        apply(&mut state, statement).map_err(|reason| Error::execution(statement, reason))?;
        state.executed.push((statement.to_string(), consistency));
        Ok(())
    }

    fn query(
        &mut self,
        query: &str,
        consistency: ConsistencyLevel,
    ) -> Result<Box<dyn RowCursor + '_>> {
        let mut state = self.state.lock();
        check_injected(&state, query)?;
        let cursor = select(&state, query).map_err(|reason| Error::execution(query, reason))?;
        state.queries.push((query.to_string(), consistency));
        Ok(Box::new(cursor))
    }
}

fn check_injected(state: &ClusterState, statement: &str) -> Result<()> {
    if state.fail_on.iter().any(|needle| statement.contains(needle.as_str())) {
        return Err(Error::execution(statement, "injected failure"));
    }
    Ok(())
}

/// Snapshot of a query result
struct MemoryCursor {
    columns: Vec<ColumnSpec>,
    rows: std::vec::IntoIter<Vec<CqlValue>>,
}

impl RowCursor for MemoryCursor {
    fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<CqlValue>>> {
        Ok(self.rows.next())
    }
}

fn keyspace_mut<'a>(state: &'a mut ClusterState, name: &str) -> cql::ParseResult<&'a mut KeyspaceData> {
    state
        .keyspaces
        .get_mut(name)
        .ok_or_else(|| format!("Keyspace {} does not exist", name))
}

fn table_of<'a>(data: &'a KeyspaceData, keyspace: &str, table: &str) -> cql::ParseResult<&'a TableMetadata> {
    data.metadata
        .table(table)
        .ok_or_else(|| format!("unconfigured table {}.{}", keyspace, table))
}

/// Typed values for `(column, literal)` pairs of `table`
fn typed_pairs(
    table: &TableMetadata,
    user_types: &[UserType],
    pairs: &[(String, Literal)],
) -> cql::ParseResult<Vec<(String, CqlValue)>> {
    pairs
        .iter()
        .map(|(column, literal)| {
            let metadata = table
                .column(column)
                .ok_or_else(|| format!("Undefined column name {}", column))?;
            Ok((column.clone(), to_value(literal, &metadata.column_type, user_types)?))
        })
        .collect()
}

/// Primary key of a row given as `(column, value)` pairs
fn primary_key(table: &TableMetadata, values: &[(String, CqlValue)]) -> cql::ParseResult<Vec<String>> {
    table
        .partition_key()
        .chain(table.clustering_columns())
        .map(|key| {
            values
                .iter()
                .find(|(name, _)| *name == key.name)
                .and_then(|(_, value)| value.to_cql_literal())
                .ok_or_else(|| format!("Missing mandatory PRIMARY KEY part {}", key.name))
        })
        .collect()
}

fn apply(state: &mut ClusterState, text: &str) -> cql::ParseResult<()> {
    match cql::parse(text)? {
        Statement::CreateKeyspace {
            name,
            if_not_exists,
            replication,
            durable_writes,
        } => {
            if state.keyspaces.contains_key(&name) {
                if if_not_exists {
                    return Ok(());
                }
                return Err(format!("Keyspace {} already exists", name));
            }
            let metadata = KeyspaceMetadata {
                name: name.clone(),
                replication,
                durable_writes,
                user_types: Vec::new(),
                tables: Vec::new(),
            };
            state.keyspaces.insert(
                name,
                KeyspaceData {
                    metadata,
                    rows: BTreeMap::new(),
                },
            );
        }
        Statement::DropKeyspace { name, if_exists } => {
            if state.keyspaces.remove(&name).is_none() && !if_exists {
                return Err(format!("Keyspace {} does not exist", name));
            }
        }
        Statement::CreateType {
            keyspace,
            name,
            fields,
        } => {
            let data = keyspace_mut(state, &keyspace)?;
            if data.metadata.user_types.iter().any(|u| u.name == name) {
                return Err(format!("A user type of name {}.{} already exists", keyspace, name));
            }
            data.metadata.user_types.push(UserType {
                keyspace,
                name,
                fields,
            });
        }
        Statement::CreateTable {
            if_not_exists,
            table,
        } => {
            let data = keyspace_mut(state, &table.keyspace)?;
            if data.metadata.table(&table.name).is_some() {
                if if_not_exists {
                    return Ok(());
                }
                return Err(format!("Table {}.{} already exists", table.keyspace, table.name));
            }
            data.rows.insert(table.name.clone(), BTreeMap::new());
            data.metadata.add_table(table);
        }
        Statement::CreateIndex {
            keyspace,
            table,
            index,
        } => {
            let data = keyspace_mut(state, &keyspace)?;
            let existing = data
                .metadata
                .tables
                .iter_mut()
                .find(|t| t.name == table)
                .ok_or_else(|| format!("unconfigured table {}.{}", keyspace, table))?;
            existing.indexes.push(index);
        }
        Statement::DropTable {
            keyspace,
            table,
            if_exists,
        } => {
            let data = keyspace_mut(state, &keyspace)?;
            let before = data.metadata.tables.len();
            data.metadata.tables.retain(|t| t.name != table);
            data.rows.remove(&table);
            if data.metadata.tables.len() == before && !if_exists {
                return Err(format!("unconfigured table {}.{}", keyspace, table));
            }
        }
        Statement::Insert {
            keyspace,
            table,
            columns,
            values,
        } => {
            let data = keyspace_mut(state, &keyspace)?;
            let metadata = table_of(data, &keyspace, &table)?;
            if metadata.is_counter_table() {
                return Err("INSERT statements are not allowed on counter tables, use UPDATE instead".to_string());
            }
            let pairs: Vec<(String, Literal)> = columns.into_iter().zip(values).collect();
            let typed = typed_pairs(metadata, &data.metadata.user_types, &pairs)?;
            let key = primary_key(metadata, &typed)?;
            let row = data
                .rows
                .entry(table)
                .or_default()
                .entry(key)
                .or_default();
            for (column, value) in typed {
                if value.is_null() {
                    row.remove(&column);
                } else {
                    row.insert(column, value);
                }
            }
        }
        Statement::Update {
            keyspace,
            table,
            assignments,
            filter,
        } => {
            let data = keyspace_mut(state, &keyspace)?;
            let metadata = table_of(data, &keyspace, &table)?;
            let user_types = &data.metadata.user_types;
            let typed_filter = typed_pairs(metadata, user_types, &filter)?;
            let key = primary_key(metadata, &typed_filter)?;

            let mut changes: Vec<(String, CqlValue, bool)> = Vec::new();
            for assignment in &assignments {
                let (column, literal, increment) = match assignment {
                    Assignment::Set(c, l) => (c, l, false),
                    Assignment::Increment(c, l) => (c, l, true),
                };
                let column_meta = metadata
                    .column(column)
                    .ok_or_else(|| format!("Undefined column name {}", column))?;
                if column_meta.is_counter() != increment {
                    return Err(format!(
                        "Invalid operation for {} column {}",
                        column_meta.column_type, column
                    ));
                }
                let value = to_value(literal, &column_meta.column_type, user_types)?;
                changes.push((column.clone(), value, increment));
            }

            let row = data
                .rows
                .entry(table)
                .or_default()
                .entry(key)
                .or_default();
            for (column, key_value) in typed_filter {
                row.insert(column, key_value);
            }
            for (column, value, increment) in changes {
                if increment {
                    let delta = match value {
                        CqlValue::Counter(d) => d,
                        _ => 0,
                    };
                    let current = match row.get(&column) {
                        Some(CqlValue::Counter(c)) => *c,
                        _ => 0,
                    };
                    row.insert(column, CqlValue::Counter(current + delta));
                } else if value.is_null() {
                    row.remove(&column);
                } else {
                    row.insert(column, value);
                }
            }
        }
        Statement::Select { .. } => {
            select(state, text)?;
        }
    }
    Ok(())
}

fn select(state: &ClusterState, text: &str) -> cql::ParseResult<MemoryCursor> {
    let Statement::Select {
        keyspace,
        table,
        filter,
        limit,
    } = cql::parse(text)?
    else {
        return Err("only SELECT returns rows".to_string());
    };
    let data = state
        .keyspaces
        .get(&keyspace)
        .ok_or_else(|| format!("Keyspace {} does not exist", keyspace))?;
    let metadata = table_of(data, &keyspace, &table)?;
    let wanted = typed_pairs(metadata, &data.metadata.user_types, &filter)?;

    let columns: Vec<ColumnSpec> = metadata
        .columns
        .iter()
        .map(|c| ColumnSpec::new(c.name.clone(), c.column_type.clone()))
        .collect();
    let rows: Vec<Vec<CqlValue>> = data
        .rows
        .get(&table)
        .into_iter()
        .flat_map(|rows| rows.values())
        .filter(|cells| {
            wanted
                .iter()
                .all(|(column, value)| cells.get(column) == Some(value))
        })
        .take(limit.unwrap_or(usize::MAX))
        .map(|cells| {
            columns
                .iter()
                .map(|c| cells.get(&c.name).cloned().unwrap_or(CqlValue::Null))
                .collect()
        })
        .collect();

    Ok(MemoryCursor {
        columns,
        rows: rows.into_iter(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryCluster {
        let cluster = MemoryCluster::empty();
        cluster.run("CREATE KEYSPACE ks WITH replication = {'class': 'SimpleStrategy', 'replication_factor': '1'}");
        cluster.run("CREATE TABLE ks.users (id int PRIMARY KEY, name text, age int)");
        cluster.run("CREATE TABLE ks.hits (page text PRIMARY KEY, views counter)");
        cluster
    }

    #[test]
    fn test_insert_and_select() {
        let cluster = seeded();
        cluster.run("INSERT INTO ks.users (id, name) VALUES (1, 'ann')");
        cluster.run("INSERT INTO \"ks\".\"users\" (\"id\", \"age\") VALUES (2, 30)");

        let mut session = cluster.session();
        let mut cursor = session
            .query("SELECT * FROM ks.users WHERE id = 2", ConsistencyLevel::One)
            .unwrap();
        let names: Vec<&str> = cursor.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "age", "name"]);
        assert_eq!(
            cursor.next_row().unwrap(),
            Some(vec![CqlValue::Int(2), CqlValue::Int(30), CqlValue::Null])
        );
        assert_eq!(cursor.next_row().unwrap(), None);
    }

    #[test]
    fn test_counter_increments_accumulate() {
        let cluster = seeded();
        cluster.run("UPDATE ks.hits SET views = views + 2 WHERE page = 'a'");
        cluster.run("UPDATE ks.hits SET views = views + 3 WHERE page = 'a'");
        let rows = cluster.rows("ks", "hits").unwrap();
        assert_eq!(rows[0].get("views"), Some(&CqlValue::Counter(5)));
    }

    #[test]
    fn test_counter_insert_rejected() {
        let cluster = seeded();
        let mut session = cluster.session();
        let err = session
            .execute(
                "INSERT INTO ks.hits (page, views) VALUES ('a', 1)",
                ConsistencyLevel::One,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
    }

    #[test]
    fn test_limit() {
        let cluster = seeded();
        for i in 0..4 {
            cluster.run(&format!("INSERT INTO ks.users (id) VALUES ({})", i));
        }
        let mut session = cluster.session();
        let mut cursor = session
            .query("SELECT * FROM ks.users LIMIT 3", ConsistencyLevel::One)
            .unwrap();
        let mut count = 0;
        while cursor.next_row().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_drop_if_exists() {
        let cluster = seeded();
        cluster.run("DROP TABLE IF EXISTS ks.nothing");
        cluster.run("DROP KEYSPACE IF EXISTS \"ks\"");
        assert!(cluster.keyspace_metadata("ks").is_none());
        let mut session = cluster.session();
        assert!(session
            .execute("DROP KEYSPACE ks", ConsistencyLevel::One)
            .is_err());
    }

    #[test]
    fn test_sessions_are_counted() {
        let cluster = MemoryCluster::new();
        {
            let _a = cluster.session();
            let _b = cluster.session();
            assert_eq!(cluster.open_sessions(), 2);
        }
        assert_eq!(cluster.open_sessions(), 0);
    }

    #[test]
    fn test_system_keyspaces_present() {
        let mut session = MemoryCluster::new().session();
        assert_eq!(
            session.keyspace_names().unwrap(),
            vec!["system".to_string(), "system_traces".to_string()]
        );
    }

    #[test]
    fn test_injected_failure_not_recorded() {
        let cluster = seeded();
        cluster.clear_history();
        cluster.fail_statements_containing("'bad'");
        let mut session = cluster.session();
        assert!(session
            .execute("INSERT INTO ks.users (id, name) VALUES (1, 'bad')", ConsistencyLevel::One)
            .is_err());
        assert!(cluster.executed().is_empty());
    }
}
