use rusqlite::Connection;
use std::time::{SystemTime, UNIX_EPOCH};
use todopad_core::db::migrations::latest_version;
use todopad_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "tasks");
    for column in ["id", "title", "is_done", "created_at", "priority", "due_date"] {
        assert_column_exists(&conn, "tasks", column);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todopad.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "tasks");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn legacy_v1_store_migrates_to_latest_without_data_loss() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy_v1.db");

    // Stage a store exactly as the first release laid it out.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            is_done INTEGER NOT NULL DEFAULT 0
        );
        INSERT INTO tasks (title, is_done) VALUES ('pay rent', 0);
        INSERT INTO tasks (title, is_done) VALUES ('water plants', 1);
        PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let before = epoch_ms_now();
    let conn = open_db(&path).unwrap();
    let after = epoch_ms_now();

    assert_eq!(schema_version(&conn), latest_version());

    let rows: Vec<(i64, String, i64, i64, String, Option<i64>)> = conn
        .prepare(
            "SELECT id, title, is_done, created_at, priority, due_date
             FROM tasks ORDER BY id ASC;",
        )
        .unwrap()
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(rows.len(), 2);

    let (id, title, is_done, created_at, priority, due_date) = &rows[0];
    assert_eq!(*id, 1);
    assert_eq!(title, "pay rent");
    assert_eq!(*is_done, 0);
    assert!(
        (before..=after).contains(created_at),
        "created_at {created_at} should be backfilled from the migration clock"
    );
    assert_eq!(priority, "NORMAL");
    assert_eq!(*due_date, None);

    let (id, title, is_done, ..) = &rows[1];
    assert_eq!(*id, 2);
    assert_eq!(title, "water plants");
    assert_eq!(*is_done, 1);
}

#[test]
fn legacy_v3_store_keeps_existing_priorities() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy_v3.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            is_done INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL DEFAULT 1700000000000,
            priority TEXT NOT NULL DEFAULT 'NORMAL'
        );
        INSERT INTO tasks (title, is_done, created_at, priority)
        VALUES ('escalated', 0, 1700000000001, 'HIGH');
        PRAGMA user_version = 3;",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_column_exists(&conn, "tasks", "due_date");

    let (priority, created_at, due_date): (String, i64, Option<i64>) = conn
        .query_row(
            "SELECT priority, created_at, due_date FROM tasks WHERE id = 1;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(priority, "HIGH");
    assert_eq!(created_at, 1_700_000_000_001);
    assert_eq!(due_date, None);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

fn assert_column_exists(conn: &Connection, table_name: &str, column_name: &str) {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table_name});"))
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    while let Some(row) = rows.next().unwrap() {
        let name: String = row.get(1).unwrap();
        if name == column_name {
            return;
        }
    }
    panic!("column {column_name} does not exist in table {table_name}");
}

fn epoch_ms_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}
