use museum_core::db::migrations::latest_version;
use museum_core::db::{open_db, open_db_in_memory, DbError};
use museum_core::{SlotStore, SqliteSlotStore, RESERVATIONS_SLOT};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "storage_slots");
}

#[test]
fn slot_contents_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("museum_portal.sqlite3");

    let first = SqliteSlotStore::open(&path).unwrap();
    first.write_slot(RESERVATIONS_SLOT, "[]").unwrap();
    drop(first);

    let second = SqliteSlotStore::open(&path).unwrap();
    assert_eq!(
        second.read_slot(RESERVATIONS_SLOT).unwrap().as_deref(),
        Some("[]")
    );
    assert_eq!(schema_version(&open_db(&path).unwrap()), latest_version());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
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
