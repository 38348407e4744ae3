//! SQLite-backed storage shared by the version store, the catalog lookups
//! and the summary snapshots.

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{SiteStatsError, StatsResult};

/// SQLite store holding site versions, lookup tables and snapshots.
///
/// The connection sits behind a mutex; writers additionally take SQLite's
/// write lock up front (`BEGIN IMMEDIATE`), so concurrent inserts for the
/// same url are serialized even across processes.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path
    pub fn new(path: impl AsRef<Path>) -> StatsResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StatsResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StatsResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Lock the connection.
    pub(crate) fn conn(&self) -> StatsResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SiteStatsError::Internal("store connection mutex poisoned".to_string()))
    }

    fn init_schema(&self) -> StatsResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS site_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                active_start_date TEXT NOT NULL,
                active_end_date TEXT,
                site_type TEXT NOT NULL DEFAULT 'General',
                name TEXT NOT NULL DEFAULT '',
                course_count INTEGER,
                last_checked TEXT,
                org_type TEXT NOT NULL DEFAULT '',
                github_fork TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                course_type TEXT NOT NULL DEFAULT 'Unknown',
                registered_user_count INTEGER,
                active_learner_count INTEGER,
                UNIQUE(url, active_start_date)
            );

            -- At most one open-ended version per site
            CREATE UNIQUE INDEX IF NOT EXISTS idx_site_versions_current
                ON site_versions(url) WHERE active_end_date IS NULL;

            -- Index for range scans
            CREATE INDEX IF NOT EXISTS idx_site_versions_start
                ON site_versions(active_start_date);

            CREATE TABLE IF NOT EXISTS languages (
                name TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS geo_zones (
                name TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS site_languages (
                site_id INTEGER NOT NULL REFERENCES site_versions(id) ON DELETE CASCADE,
                language TEXT NOT NULL REFERENCES languages(name) ON DELETE CASCADE,
                UNIQUE(site_id, language)
            );

            CREATE TABLE IF NOT EXISTS site_geo_zones (
                site_id INTEGER NOT NULL REFERENCES site_versions(id) ON DELETE CASCADE,
                geo_zone TEXT NOT NULL REFERENCES geo_zones(name) ON DELETE CASCADE,
                UNIQUE(site_id, geo_zone)
            );

            CREATE TABLE IF NOT EXISTS site_summary_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                num_sites INTEGER NOT NULL,
                num_courses INTEGER NOT NULL,
                notes TEXT NOT NULL DEFAULT ''
            );
        "#,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_schema() {
        let store = SqliteStore::in_memory().unwrap();
        let conn = store.conn().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                 ('site_versions', 'languages', 'geo_zones', 'site_languages',
                  'site_geo_zones', 'site_summary_snapshots')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 6);
    }

    #[test]
    fn test_file_store_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sites.db");
        {
            let store = SqliteStore::new(&path).unwrap();
            store
                .conn()
                .unwrap()
                .execute("INSERT INTO languages(name) VALUES ('English')", [])
                .unwrap();
        }
        let store = SqliteStore::new(&path).unwrap();
        let count: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM languages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
