use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::{Connection, params, params_from_iter};

use crate::history::{HistoryEntry, NewHistoryView};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                );

                CREATE TABLE IF NOT EXISTS view_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recipe_id TEXT NOT NULL,
                    recipe_name TEXT NOT NULL,
                    category TEXT NOT NULL DEFAULT '',
                    image_path TEXT,
                    viewed_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_view_history_viewed_at ON view_history(viewed_at);
                CREATE INDEX IF NOT EXISTS idx_view_history_recipe ON view_history(recipe_id);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Key/value blobs ---

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_store WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn delete_value(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    // --- Browsing history ---

    fn history_from_row(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
        let viewed_at: String = row.get(5)?;
        let viewed_at = DateTime::parse_from_rfc3339(&viewed_at)
            .map(|d| d.with_timezone(&Local))
            .unwrap_or_else(|_| DateTime::<Utc>::default().with_timezone(&Local));
        Ok(HistoryEntry {
            id: row.get(0)?,
            recipe_id: row.get(1)?,
            recipe_name: row.get(2)?,
            category: row.get(3)?,
            image_path: row.get(4)?,
            viewed_at,
        })
    }

    pub fn record_view(&self, view: &NewHistoryView, at: DateTime<Local>) -> Result<HistoryEntry> {
        // Stored in UTC so lexical order matches time order.
        let stamp = at
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        self.conn.execute(
            "INSERT INTO view_history (recipe_id, recipe_name, category, image_path, viewed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                view.recipe_id,
                view.recipe_name,
                view.category,
                view.image_path,
                stamp
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT id, recipe_id, recipe_name, category, image_path, viewed_at
                 FROM view_history WHERE id = ?1",
                params![id],
                Self::history_from_row,
            )
            .context("Failed to read back history entry")
    }

    /// Newest first.
    pub fn list_history(&self, limit: i64, offset: i64) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipe_id, recipe_name, category, image_path, viewed_at
             FROM view_history ORDER BY viewed_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let entries = stmt
            .query_map(params![limit, offset], Self::history_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn count_history(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM view_history", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete every view of the given recipes. Returns the number of rows removed.
    pub fn remove_history(&self, recipe_ids: &[String]) -> Result<usize> {
        if recipe_ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; recipe_ids.len()].join(", ");
        let sql = format!("DELETE FROM view_history WHERE recipe_id IN ({placeholders})");
        let rows = self.conn.execute(&sql, params_from_iter(recipe_ids))?;
        Ok(rows)
    }

    pub fn clear_history(&self) -> Result<usize> {
        let rows = self.conn.execute("DELETE FROM view_history", [])?;
        Ok(rows)
    }
}
