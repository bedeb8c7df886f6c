//! Named key-value slots for the local fallback store.
//!
//! # Responsibility
//! - Hold one opaque text value per slot key.
//! - Replace a slot's whole value on write.
//!
//! # Invariants
//! - A missing slot reads as `None`, never as an error.
//! - Writes are single-statement upserts; readers see the old or the new
//!   value, never a mix.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Persistent string slots keyed by name.
pub trait SlotStore: Send {
    fn read_slot(&self, key: &str) -> DbResult<Option<String>>;
    fn write_slot(&self, key: &str, value: &str) -> DbResult<()>;
}

/// SQLite-backed slot store over the `storage_slots` table.
pub struct SqliteSlotStore {
    conn: Connection,
}

impl SqliteSlotStore {
    /// Wraps a connection returned by `open_db*`.
    ///
    /// Rejects connections whose schema version is not the latest one.
    pub fn try_new(conn: Connection) -> DbResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(&conn)?;
        if actual_version != expected_version {
            return Err(DbError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    /// Opens a slot database file, creating and migrating it when needed.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::try_new(open_db(path)?)
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }
}

impl SlotStore for SqliteSlotStore {
    fn read_slot(&self, key: &str) -> DbResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT slot_value FROM storage_slots WHERE slot_key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_slot(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO storage_slots (slot_key, slot_value)
             VALUES (?1, ?2)
             ON CONFLICT(slot_key) DO UPDATE SET
                slot_value = excluded.slot_value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SlotStore, SqliteSlotStore};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn missing_slot_reads_as_none() {
        let store = SqliteSlotStore::open_in_memory().unwrap();
        assert_eq!(store.read_slot("absent").unwrap(), None);
    }

    #[test]
    fn write_replaces_previous_value() {
        let store = SqliteSlotStore::open_in_memory().unwrap();
        store.write_slot("k", "[1]").unwrap();
        store.write_slot("k", "[2]").unwrap();

        assert_eq!(store.read_slot("k").unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn unmigrated_connection_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();

        match SqliteSlotStore::try_new(conn) {
            Err(DbError::UninitializedConnection {
                expected_version,
                actual_version: 0,
            }) => assert!(expected_version > 0),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected uninitialized connection error"),
        }
    }
}
