//! SQLite preference store
//!
//! Entries live in a single `preferences` table. Each commit runs in one
//! transaction with `synchronous=FULL`, so a returned commit is durable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};

use super::{validate_key, Batch, PreferenceStore, StoreError};
use crate::domain::PrefValue;

/// Store backed by a SQLite database
pub struct SqliteStore {
    /// Path to the database, `None` for in-memory databases
    db_path: Option<PathBuf>,

    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Schema version - bump when schema changes
    const SCHEMA_VERSION: i32 = 1;

    /// Creates or opens the database at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL;")?;

        log::debug!("Opened preference database {}", db_path.display());
        Self::with_connection(conn, Some(db_path))
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self, StoreError> {
        ensure_schema(&conn)?;
        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
        })
    }

    /// Returns the database path, if the store is file-backed
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_schema(conn: &Connection) -> Result<(), StoreError> {
    let current: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .optional()?
        .unwrap_or(0);

    if current == SqliteStore::SCHEMA_VERSION {
        return Ok(());
    }

    if current > SqliteStore::SCHEMA_VERSION {
        // Written by a newer build; leave its version stamp alone
        log::warn!(
            "Preference database has newer schema version {} (expected {})",
            current,
            SqliteStore::SCHEMA_VERSION
        );
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS preferences (
            key TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            value TEXT NOT NULL
        );
        ",
    )?;

    if current == 0 {
        conn.execute(
            &format!("PRAGMA user_version = {}", SqliteStore::SCHEMA_VERSION),
            [],
        )?;
    }

    Ok(())
}

fn decode(raw: &str) -> Result<PrefValue, StoreError> {
    Ok(serde_json::from_str(raw)?)
}

impl PreferenceStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<PrefValue>, StoreError> {
        validate_key(key)?;

        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        raw.as_deref().map(decode).transpose()
    }

    fn all(&self) -> Result<BTreeMap<String, PrefValue>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key, value FROM preferences")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = BTreeMap::new();
        for row in rows {
            let (key, raw) = row?;
            entries.insert(key, decode(&raw)?);
        }

        Ok(entries)
    }

    fn commit(&self, batch: &Batch) -> Result<(), StoreError> {
        batch.validate()?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if batch.clears() {
            tx.execute("DELETE FROM preferences", [])?;
        }

        for (key, value) in batch.changes() {
            match value {
                Some(value) => {
                    tx.execute(
                        "INSERT OR REPLACE INTO preferences (key, kind, value) VALUES (?1, ?2, ?3)",
                        params![key, value.kind().as_str(), serde_json::to_string(value)?],
                    )?;
                }
                None => {
                    tx.execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
                }
            }
        }

        tx.commit()?;

        log::debug!(
            "Committed {} change(s) to sqlite store{}",
            batch.len(),
            self.db_path
                .as_ref()
                .map(|p| format!(" {}", p.display()))
                .unwrap_or_default()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StorageKind;
    use crate::storage::Editor;
    use tempfile::TempDir;

    #[test]
    fn in_memory_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.path().is_none());

        Editor::new(&store)
            .put_string("name", "pickle")
            .put_boolean("flag", true)
            .commit()
            .unwrap();

        assert_eq!(store.get_string("name", "").unwrap(), "pickle");
        assert!(store.get_boolean("flag", false).unwrap());
        assert_eq!(store.get_int("missing", -1).unwrap(), -1);
    }

    #[test]
    fn commit_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            Editor::new(&store)
                .put_long("epoch", 1_700_000_000_000)
                .put_string_set("tags", ["b", "a"])
                .commit()
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_long("epoch", -1).unwrap(), 1_700_000_000_000);

        let all = store.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["tags"].kind(), StorageKind::StringSet);
    }

    #[test]
    fn clear_and_remove() {
        let store = SqliteStore::open_in_memory().unwrap();
        Editor::new(&store)
            .put_int("a", 1)
            .put_int("b", 2)
            .commit()
            .unwrap();

        Editor::new(&store).remove("a").commit().unwrap();
        assert!(!store.contains("a").unwrap());

        Editor::new(&store).clear().put_int("c", 3).commit().unwrap();
        let all = store.all().unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn non_finite_floats_read_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        Editor::new(&store)
            .put_float("nan", f32::NAN)
            .put_float("down", f32::NEG_INFINITY)
            .commit()
            .unwrap();

        assert!(store.get_float("nan", 0.0).unwrap().is_nan());
        assert_eq!(store.get_float("down", 0.0).unwrap(), f32::NEG_INFINITY);
        assert_eq!(store.all().unwrap().len(), 2);
    }

    fn user_version(store: &SqliteStore) -> i32 {
        store
            .conn()
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn fresh_database_is_stamped() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(user_version(&store), SqliteStore::SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_version_is_not_downgraded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            Editor::new(&store).put_int("kept", 7).commit().unwrap();
            store
                .conn()
                .execute_batch("PRAGMA user_version = 2;")
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(user_version(&store), 2);
        assert_eq!(store.get_int("kept", -1).unwrap(), 7);
    }

    #[test]
    fn kind_column_is_populated() {
        let store = SqliteStore::open_in_memory().unwrap();
        Editor::new(&store).put_float("ratio", 0.5).commit().unwrap();

        let kind: String = store
            .conn()
            .query_row(
                "SELECT kind FROM preferences WHERE key = 'ratio'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(kind, "float");
    }
}
