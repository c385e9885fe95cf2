//! Replaying hand-written and exported logs.

mod common;

use common::*;
use cqldump::{ConsistencyLevel, Error};

fn write_log(text: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let (dir, path) = log_path();
    std::fs::write(&path, text).unwrap();
    (dir, path)
}

fn seeded() -> MemoryCluster {
    let cluster = MemoryCluster::new();
    cluster.run(&format!("CREATE KEYSPACE ks WITH replication = {}", REPLICATION));
    cluster.run("CREATE TABLE ks.t (id int PRIMARY KEY, v text)");
    cluster.clear_history();
    cluster
}

#[test]
fn test_levels_follow_directives() {
    let cluster = seeded();
    let (_dir, path) = write_log(
        "CONSISTENCY ALL;\nDROP TABLE IF EXISTS ks.t;\n\
         CREATE TABLE ks.t (id int PRIMARY KEY, v text);\n\
         consistency quorum;\nINSERT INTO ks.t (id, v) VALUES (1, 'a');\n",
    );
    let stats = import(&cluster, &path, ImportOptions::new());
    assert_eq!(stats.directives, 2);
    assert_eq!(stats.statements_executed, 3);

    let levels: Vec<ConsistencyLevel> = cluster.executed().into_iter().map(|(_, l)| l).collect();
    assert_eq!(
        levels,
        vec![
            ConsistencyLevel::All,
            ConsistencyLevel::All,
            ConsistencyLevel::Quorum
        ]
    );
}

#[test]
fn test_multi_line_statement() {
    let cluster = seeded();
    let (_dir, path) = write_log("INSERT INTO ks.t (id, v)\n  VALUES (7, 'x');\n");
    import(&cluster, &path, ImportOptions::new());
    let rows = rows(&cluster, "ks", "t");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("v"), Some(&CqlValue::Text("x".into())));
}

#[test]
fn test_unterminated_tail_still_runs() {
    let cluster = seeded();
    let (_dir, path) = write_log(
        "INSERT INTO ks.t (id, v) VALUES (1, 'a');\nINSERT INTO ks.t (id, v) VALUES (2, 'b')",
    );
    let stats = import(&cluster, &path, ImportOptions::new());
    assert!(stats.unterminated_tail);
    assert_eq!(rows(&cluster, "ks", "t").len(), 2);
}

#[test]
fn test_failure_stops_replay_and_keeps_earlier_writes() {
    let cluster = seeded();
    cluster.fail_statements_containing("VALUES (2,");
    let (_dir, path) = write_log(
        "INSERT INTO ks.t (id, v) VALUES (1, 'a');\n\
         INSERT INTO ks.t (id, v) VALUES (2, 'b');\n\
         INSERT INTO ks.t (id, v) VALUES (3, 'c');\n",
    );
    let mut session = cluster.session();
    let err = import_file(&mut session, &path, ImportOptions::new().with_quiet(true)).unwrap_err();
    assert_eq!(err.category(), cqldump::ErrorCategory::Execution);
    assert_eq!(rows(&cluster, "ks", "t").len(), 1);
}

#[test]
fn test_bad_directive_is_malformed_log() {
    let cluster = seeded();
    let (_dir, path) = write_log("CONSISTENCY SOMETIMES;\n");
    let mut session = cluster.session();
    let err = import_file(&mut session, &path, ImportOptions::new().with_quiet(true)).unwrap_err();
    assert!(matches!(err, Error::MalformedLog { line: 1, .. }));
    assert!(cluster.executed().is_empty());
}

#[test]
fn test_missing_file_is_io_error() {
    let cluster = seeded();
    let dir = tempfile::tempdir().unwrap();
    let mut session = cluster.session();
    let err = import_file(
        &mut session,
        &dir.path().join("absent.cql"),
        ImportOptions::new().with_quiet(true),
    )
    .unwrap_err();
    assert_eq!(err.category(), cqldump::ErrorCategory::Io);
}
