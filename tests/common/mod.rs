//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

pub use cqldump::testing::MemoryCluster;
pub use cqldump::{
    export_to_file, import_file, CqlValue, ExportOptions, ExportStats, ImportOptions, ReplayStats,
};
use tempfile::TempDir;

pub const REPLICATION: &str =
    "{'class': 'SimpleStrategy', 'replication_factor': '1'}";

/// A cluster with keyspace `shop`: a plain table, a counter table and a
/// clustered table.
pub fn shop_cluster() -> MemoryCluster {
    let cluster = MemoryCluster::new();
    cluster.run(&format!("CREATE KEYSPACE shop WITH replication = {}", REPLICATION));
    cluster.run(
        "CREATE TABLE shop.items (id int PRIMARY KEY, name text, tags list<text>, \
         stock map<text, int>, active boolean)",
    );
    cluster.run("CREATE TABLE shop.views (item int PRIMARY KEY, total counter)");
    cluster.run(
        "CREATE TABLE shop.orders (customer text, placed int, amount double, \
         PRIMARY KEY (customer, placed))",
    );

    cluster.run(
        "INSERT INTO shop.items (id, name, tags, stock, active) \
         VALUES (1, 'it''s a mug', ['kitchen', 'gift'], {'north': 4, 'south': 0}, true)",
    );
    cluster.run("INSERT INTO shop.items (id, name) VALUES (2, 'plain')");
    cluster.run("UPDATE shop.views SET total = total + 7 WHERE item = 1");
    cluster.run("UPDATE shop.views SET total = total + 2 WHERE item = 2");
    cluster.run("INSERT INTO shop.orders (customer, placed, amount) VALUES ('ann', 1, 9.5)");
    cluster.run("INSERT INTO shop.orders (customer, placed, amount) VALUES ('ann', 2, 3.25)");
    cluster.run("INSERT INTO shop.orders (customer, placed) VALUES ('bob', 1)");
    cluster.clear_history();
    cluster
}

/// Temp dir plus the log path inside it
pub fn log_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.cql");
    (dir, path)
}

/// Export `cluster` with `options` into a fresh log file
pub fn export(cluster: &MemoryCluster, options: ExportOptions) -> (TempDir, PathBuf, ExportStats) {
    let (dir, path) = log_path();
    let mut session = cluster.session();
    let stats = export_to_file(&mut session, &path, options.with_quiet(true)).unwrap();
    (dir, path, stats)
}

/// Replay the log at `path` into `cluster`
pub fn import(cluster: &MemoryCluster, path: &std::path::Path, options: ImportOptions) -> ReplayStats {
    let mut session = cluster.session();
    import_file(&mut session, path, options.with_quiet(true)).unwrap()
}

/// Every row of `keyspace.table`, panicking when the table is missing
pub fn rows(cluster: &MemoryCluster, keyspace: &str, table: &str) -> Vec<BTreeMap<String, CqlValue>> {
    cluster
        .rows(keyspace, table)
        .unwrap_or_else(|| panic!("missing table {}.{}", keyspace, table))
}

/// Non-empty lines of a log
pub fn statements(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}
