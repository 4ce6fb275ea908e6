use lazytask_core::db::migrations::latest_version;
use lazytask_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "tasks");
    assert_table_exists(&conn, "task_categories");
    assert_index_exists(&conn, "idx_tasks_status_due");
    assert_index_exists(&conn, "idx_task_categories_category");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lazytask.db");

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
fn schema_rejects_out_of_vocabulary_values() {
    let conn = open_db_in_memory().unwrap();

    let bad_priority = conn.execute(
        "INSERT INTO tasks (uuid, title, priority) VALUES ('a', 'essay', 'urgent');",
        [],
    );
    assert!(bad_priority.is_err());

    let blank_title = conn.execute(
        "INSERT INTO tasks (uuid, title, priority) VALUES ('b', '   ', 'low');",
        [],
    );
    assert!(blank_title.is_err());

    conn.execute(
        "INSERT INTO tasks (uuid, title, priority) VALUES ('c', 'essay', 'low');",
        [],
    )
    .unwrap();
    let status: String = conn
        .query_row("SELECT status FROM tasks WHERE uuid = 'c';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(status, "todo");
}

#[test]
fn deleting_task_cascades_to_categories() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO tasks (uuid, title, priority) VALUES ('t1', 'essay', 'low');
         INSERT INTO task_categories (task_uuid, category, position) VALUES ('t1', 'theory', 0);
         DELETE FROM tasks WHERE uuid = 't1';",
    )
    .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM task_categories;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert_schema_object(conn, "table", table_name);
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    assert_schema_object(conn, "index", index_name);
}

fn assert_schema_object(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
