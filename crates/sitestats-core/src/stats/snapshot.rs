//! Imported over-time summary rows.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::SqliteStore;
use crate::error::{SiteStatsError, StatsResult};
use crate::time;

/// Site and course totals recorded at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSummarySnapshot {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub num_sites: i64,
    pub num_courses: i64,
    /// Reasons for discrepancies with the derived counts
    pub notes: String,
}

/// Trait for summary snapshot storage
pub trait SnapshotStore: Send + Sync {
    /// Record a snapshot
    fn add_snapshot(
        &self,
        timestamp: DateTime<Utc>,
        num_sites: i64,
        num_courses: i64,
        notes: &str,
    ) -> StatsResult<SiteSummarySnapshot>;

    /// All snapshots, ascending by timestamp
    fn summary_snapshots(&self) -> StatsResult<Vec<SiteSummarySnapshot>>;

    /// Count stored snapshots
    fn count_snapshots(&self) -> StatsResult<usize>;
}

impl SnapshotStore for SqliteStore {
    fn add_snapshot(
        &self,
        timestamp: DateTime<Utc>,
        num_sites: i64,
        num_courses: i64,
        notes: &str,
    ) -> StatsResult<SiteSummarySnapshot> {
        if num_sites < 0 || num_courses < 0 {
            return Err(SiteStatsError::validation(
                "Snapshot counts must not be negative",
            ));
        }
        let timestamp = time::storable(timestamp)?;
        let conn = self.conn()?;
        conn.execute(
            r#"INSERT INTO site_summary_snapshots (timestamp, num_sites, num_courses, notes)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![time::to_sql(&timestamp), num_sites, num_courses, notes],
        )?;

        Ok(SiteSummarySnapshot {
            id: conn.last_insert_rowid(),
            timestamp,
            num_sites,
            num_courses,
            notes: notes.to_string(),
        })
    }

    fn summary_snapshots(&self) -> StatsResult<Vec<SiteSummarySnapshot>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, timestamp, num_sites, num_courses, notes
               FROM site_summary_snapshots
               ORDER BY timestamp ASC, id ASC"#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut snapshots = Vec::new();
        for row in rows {
            let (id, timestamp, num_sites, num_courses, notes) = row?;
            snapshots.push(SiteSummarySnapshot {
                id,
                timestamp: time::from_sql(&timestamp)?,
                num_sites,
                num_courses,
                notes,
            });
        }
        Ok(snapshots)
    }

    fn count_snapshots(&self) -> StatsResult<usize> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM site_summary_snapshots", [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }
}
