//! Selection modes against a whole cluster, written to real files.

mod common;

use common::*;
use cqldump::{Selection, TableRef};

#[test]
fn test_default_selection_covers_user_keyspaces() {
    let cluster = shop_cluster();
    cluster.run(&format!("CREATE KEYSPACE audit WITH replication = {}", REPLICATION));
    cluster.run("CREATE TABLE audit.log (id int PRIMARY KEY, what text)");
    cluster.run("INSERT INTO audit.log (id, what) VALUES (1, 'login')");

    let (_dir, path, stats) = export(&cluster, ExportOptions::new());
    assert_eq!(stats.keyspaces, 2);
    let log = std::fs::read_to_string(&path).unwrap();
    assert!(log.contains("DROP KEYSPACE IF EXISTS \"audit\";"));
    assert!(log.contains("DROP KEYSPACE IF EXISTS \"shop\";"));
    assert!(!log.contains("\"system"));
}

#[test]
fn test_table_selection_across_keyspaces() {
    let cluster = shop_cluster();
    let tables = vec![TableRef::new("shop", "orders"), TableRef::new("shop", "views")];
    let (_dir, path, stats) = export(
        &cluster,
        ExportOptions::new().with_selection(Selection::Tables(tables)),
    );
    assert_eq!(stats.tables, 2);
    assert_eq!(stats.rows, 5);

    let lines = statements(&path);
    assert_eq!(lines[0], "DROP TABLE IF EXISTS \"shop\".\"orders\";");
    assert!(lines[1].starts_with("CREATE TABLE \"shop\".\"orders\""));
    assert!(!lines.iter().any(|l| l.contains("\"items\"")));
}

#[test]
fn test_filter_with_limit() {
    let cluster = shop_cluster();
    let filter = "shop.orders WHERE customer = 'ann'".parse().unwrap();
    let options = ExportOptions::new()
        .with_selection(Selection::Filters(vec![filter]))
        .with_limit(Some(1));
    let (_dir, path, stats) = export(&cluster, options);
    assert_eq!(stats.rows, 1);

    let queries = cluster.queries();
    assert_eq!(
        queries.last().map(|(q, _)| q.as_str()),
        Some("SELECT * FROM shop.orders WHERE customer = 'ann' LIMIT 1")
    );
    let inserts: Vec<String> = statements(&path)
        .into_iter()
        .filter(|l| l.starts_with("INSERT"))
        .collect();
    assert_eq!(inserts.len(), 1);
    assert!(inserts[0].contains("'ann'"));
}

#[test]
fn test_exclude_by_bare_name() {
    let cluster = shop_cluster();
    let options = ExportOptions::new()
        .with_selection(Selection::Keyspaces(vec!["shop".to_string()]))
        .with_exclude(vec!["orders".to_string()]);
    let (_dir, path, stats) = export(&cluster, options);
    assert_eq!(stats.tables, 2);

    let log = std::fs::read_to_string(&path).unwrap();
    assert!(log.contains("CREATE TABLE \"shop\".\"orders\""));
    assert!(!log.contains("INSERT INTO \"shop\".\"orders\""));
}

#[test]
fn test_missing_keyspace_is_schema_error() {
    let cluster = shop_cluster();
    let (_dir, path) = log_path();
    let mut session = cluster.session();
    let options = ExportOptions::new()
        .with_selection(Selection::Keyspaces(vec!["nope".to_string()]))
        .with_quiet(true);
    let err = export_to_file(&mut session, &path, options).unwrap_err();
    assert_eq!(err.category(), cqldump::ErrorCategory::SchemaLookup);
}
