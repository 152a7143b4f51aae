use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

/// Durable string key/value storage, the terminal counterpart of a browser's
/// local storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = Database::open(&dir.path().join("nested").join("store.db")).expect("open db");
        db.migrate().expect("migrate");
        (dir, db)
    }

    #[test]
    fn set_item_overwrites_existing_value() {
        let (_dir, db) = open_temp();
        db.set_item("user", "first").expect("set");
        db.set_item("user", "second").expect("overwrite");
        assert_eq!(db.get_item("user").expect("get").as_deref(), Some("second"));
    }

    #[test]
    fn remove_item_reports_whether_key_existed() {
        let (_dir, db) = open_temp();
        db.set_item("user", "value").expect("set");
        assert!(db.remove_item("user").expect("remove"));
        assert!(!db.remove_item("user").expect("second remove"));
        assert_eq!(db.get_item("user").expect("get"), None);
    }

    #[test]
    fn migrate_is_idempotent() {
        let (_dir, db) = open_temp();
        db.migrate().expect("second migrate");
    }
}
