//! Version storage layer with point-in-time query support.
//!
//! Every mutation of a site's history (reading it, moving at most one
//! existing end date, inserting the new row and its language / geo zone
//! links) runs in a single `BEGIN IMMEDIATE` transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use std::str::FromStr;

use crate::catalog::{link_names, load_names, normalize_names, Lookup};
use crate::db::SqliteStore;
use crate::error::{SiteStatsError, StatsResult};
use crate::time;
use crate::versioning::{
    plan_insert, reject_edit_of_noncurrent, BoundaryUpdate, CourseType, SiteAttributes,
    SiteVersion, VersionSpan,
};

/// Column list shared across queries.
const VERSION_COLUMNS: &str = "id, url, active_start_date, active_end_date, site_type, name, \
    course_count, last_checked, org_type, github_fork, notes, course_type, \
    registered_user_count, active_learner_count";

/// Everything an insert changed, for callers that report counts.
#[derive(Debug, Clone)]
pub struct InsertOutcome {
    /// The newly created version
    pub version: SiteVersion,
    /// The existing version whose end date moved, if any
    pub closed: Option<BoundaryUpdate>,
    /// Languages created because the version referenced them
    pub languages_created: u32,
    /// Geo zones created because the version referenced them
    pub geozones_created: u32,
    /// Site/language links written
    pub language_links: u32,
    /// Site/geo zone links written
    pub geozone_links: u32,
}

/// Trait for site version storage operations
pub trait VersionStore: Send + Sync {
    /// Insert a version of `url` effective at `effective_at`, reporting
    /// everything the insert touched
    fn insert_version_tracked(
        &self,
        url: &str,
        effective_at: DateTime<Utc>,
        attributes: &SiteAttributes,
    ) -> StatsResult<InsertOutcome>;

    /// Insert a version of `url` effective at `effective_at`
    fn insert_version(
        &self,
        url: &str,
        effective_at: DateTime<Utc>,
        attributes: &SiteAttributes,
    ) -> StatsResult<SiteVersion> {
        self.insert_version_tracked(url, effective_at, attributes)
            .map(|outcome| outcome.version)
    }

    /// Derive a new version from version `id`, which must be current
    fn edit_version(
        &self,
        id: i64,
        effective_at: DateTime<Utc>,
        attributes: &SiteAttributes,
    ) -> StatsResult<SiteVersion>;

    /// The open-ended version of `url`
    fn current_version(&self, url: &str) -> StatsResult<Option<SiteVersion>>;

    /// The version of `url` in effect at `timestamp`
    fn version_at(&self, url: &str, timestamp: DateTime<Utc>) -> StatsResult<Option<SiteVersion>>;

    /// Get a version by row id
    fn get_version(&self, id: i64) -> StatsResult<SiteVersion>;

    /// All versions of `url`, ascending by start
    fn history(&self, url: &str) -> StatsResult<Vec<SiteVersion>>;

    /// Current version of every site, ordered by url
    fn list_current(&self) -> StatsResult<Vec<SiteVersion>>;

    /// Every stored version, ordered by url then start
    fn all_versions(&self) -> StatsResult<Vec<SiteVersion>>;

    /// Count stored versions
    fn count_versions(&self) -> StatsResult<usize>;

    /// Count distinct sites
    fn count_sites(&self) -> StatsResult<usize>;
}

impl SqliteStore {
    fn row_to_version(row: &rusqlite::Row<'_>) -> StatsResult<SiteVersion> {
        let id: i64 = row.get(0)?;
        let url: String = row.get(1)?;
        let start: String = row.get(2)?;
        let end: Option<String> = row.get(3)?;
        let last_checked: Option<String> = row.get(7)?;
        let course_type: String = row.get(11)?;

        Ok(SiteVersion {
            id,
            url,
            active_start_date: time::from_sql(&start)?,
            active_end_date: end.as_deref().map(time::from_sql).transpose()?,
            attributes: SiteAttributes {
                site_type: row.get(4)?,
                name: row.get(5)?,
                course_count: row.get(6)?,
                last_checked: last_checked.as_deref().map(time::parse_date).transpose()?,
                org_type: row.get(8)?,
                github_fork: row.get(9)?,
                notes: row.get(10)?,
                course_type: CourseType::from_str(&course_type).unwrap_or_default(),
                registered_user_count: row.get(12)?,
                active_learner_count: row.get(13)?,
                languages: Vec::new(),
                geographies: Vec::new(),
            },
        })
    }

    /// Run a version query and attach language / geo zone links.
    fn query_versions(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StatsResult<Vec<SiteVersion>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| Ok(Self::row_to_version(row)))?;
        let mut versions = rows
            .map(|r| r.map_err(SiteStatsError::from).and_then(|inner| inner))
            .collect::<StatsResult<Vec<_>>>()?;
        for version in &mut versions {
            version.attributes.languages = load_names(conn, Lookup::Language, version.id)?;
            version.attributes.geographies = load_names(conn, Lookup::GeoZone, version.id)?;
        }
        Ok(versions)
    }

    fn query_one(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StatsResult<Option<SiteVersion>> {
        Ok(Self::query_versions(conn, sql, params)?.into_iter().next())
    }

    fn load_version(conn: &Connection, id: i64) -> StatsResult<Option<SiteVersion>> {
        Self::query_one(
            conn,
            &format!("SELECT {VERSION_COLUMNS} FROM site_versions WHERE id = ?1"),
            params![id],
        )
    }

    fn load_spans(conn: &Connection, url: &str) -> StatsResult<Vec<VersionSpan>> {
        let mut stmt = conn.prepare(
            r#"SELECT id, active_start_date, active_end_date
               FROM site_versions
               WHERE url = ?1
               ORDER BY active_start_date ASC"#,
        )?;
        let rows = stmt.query_map(params![url], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut spans = Vec::new();
        for row in rows {
            let (id, start, end) = row?;
            spans.push(VersionSpan {
                id,
                start: time::from_sql(&start)?,
                end: end.as_deref().map(time::from_sql).transpose()?,
            });
        }
        Ok(spans)
    }

    /// Plan and apply one insert on an open transaction.
    fn insert_in_tx(
        conn: &Connection,
        url: &str,
        effective_at: DateTime<Utc>,
        attributes: &SiteAttributes,
    ) -> StatsResult<InsertOutcome> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SiteStatsError::validation_with_suggestion(
                "Site url is required",
                "Enter a valid URL, i.e. https://example.com",
            ));
        }
        let effective_at = time::storable(effective_at)?;

        let history = Self::load_spans(conn, url)?;
        let plan = plan_insert(url, &history, effective_at)?;

        if let Some(update) = plan.close {
            conn.execute(
                "UPDATE site_versions SET active_end_date = ?1 WHERE id = ?2",
                params![time::to_sql(&update.new_end), update.id],
            )?;
            tracing::debug!(
                url,
                version_id = update.id,
                end = %update.new_end,
                "Closed previous version"
            );
        }

        conn.execute(
            r#"INSERT INTO site_versions
               (url, active_start_date, active_end_date, site_type, name, course_count,
                last_checked, org_type, github_fork, notes, course_type,
                registered_user_count, active_learner_count)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"#,
            params![
                url,
                time::to_sql(&effective_at),
                plan.end.as_ref().map(time::to_sql),
                attributes.site_type,
                attributes.name,
                attributes.course_count,
                attributes.last_checked.map(|d| d.format("%Y-%m-%d").to_string()),
                attributes.org_type,
                attributes.github_fork,
                attributes.notes,
                attributes.course_type.as_str(),
                attributes.registered_user_count,
                attributes.active_learner_count,
            ],
        )?;
        let id = conn.last_insert_rowid();

        let languages = normalize_names(&attributes.languages);
        let geographies = normalize_names(&attributes.geographies);
        let language_counts = link_names(conn, Lookup::Language, id, &languages)?;
        let geozone_counts = link_names(conn, Lookup::GeoZone, id, &geographies)?;

        tracing::info!(
            url,
            version_id = id,
            start = %effective_at,
            current = plan.is_append(),
            "Inserted site version"
        );

        Ok(InsertOutcome {
            version: SiteVersion {
                id,
                url: url.to_string(),
                active_start_date: effective_at,
                active_end_date: plan.end,
                attributes: SiteAttributes {
                    languages,
                    geographies,
                    ..attributes.clone()
                },
            },
            closed: plan.close,
            languages_created: language_counts.created,
            geozones_created: geozone_counts.created,
            language_links: language_counts.linked,
            geozone_links: geozone_counts.linked,
        })
    }
}

impl VersionStore for SqliteStore {
    fn insert_version_tracked(
        &self,
        url: &str,
        effective_at: DateTime<Utc>,
        attributes: &SiteAttributes,
    ) -> StatsResult<InsertOutcome> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = Self::insert_in_tx(&tx, url, effective_at, attributes)?;
        tx.commit()?;
        Ok(outcome)
    }

    fn edit_version(
        &self,
        id: i64,
        effective_at: DateTime<Utc>,
        attributes: &SiteAttributes,
    ) -> StatsResult<SiteVersion> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let base = Self::load_version(&tx, id)?
            .ok_or_else(|| SiteStatsError::version_not_found(id))?;
        if reject_edit_of_noncurrent(&base) {
            tracing::warn!(version_id = id, url = %base.url, "Rejected edit of superseded version");
            return Err(SiteStatsError::non_current_edit(id));
        }

        let outcome = Self::insert_in_tx(&tx, &base.url, effective_at, attributes)?;
        tx.commit()?;
        Ok(outcome.version)
    }

    fn current_version(&self, url: &str) -> StatsResult<Option<SiteVersion>> {
        let conn = self.conn()?;
        Self::query_one(
            &conn,
            &format!(
                "SELECT {VERSION_COLUMNS} FROM site_versions
                 WHERE url = ?1 AND active_end_date IS NULL"
            ),
            params![url.trim()],
        )
    }

    fn version_at(&self, url: &str, timestamp: DateTime<Utc>) -> StatsResult<Option<SiteVersion>> {
        let conn = self.conn()?;
        Self::query_one(
            &conn,
            &format!(
                "SELECT {VERSION_COLUMNS} FROM site_versions
                 WHERE url = ?1 AND active_start_date <= ?2
                   AND (active_end_date IS NULL OR active_end_date > ?2)
                 ORDER BY active_start_date DESC
                 LIMIT 1"
            ),
            params![url.trim(), time::to_sql(&timestamp)],
        )
    }

    fn get_version(&self, id: i64) -> StatsResult<SiteVersion> {
        let conn = self.conn()?;
        Self::load_version(&conn, id)?.ok_or_else(|| SiteStatsError::version_not_found(id))
    }

    fn history(&self, url: &str) -> StatsResult<Vec<SiteVersion>> {
        let conn = self.conn()?;
        Self::query_versions(
            &conn,
            &format!(
                "SELECT {VERSION_COLUMNS} FROM site_versions
                 WHERE url = ?1
                 ORDER BY active_start_date ASC"
            ),
            params![url.trim()],
        )
    }

    fn list_current(&self) -> StatsResult<Vec<SiteVersion>> {
        let conn = self.conn()?;
        Self::query_versions(
            &conn,
            &format!(
                "SELECT {VERSION_COLUMNS} FROM site_versions
                 WHERE active_end_date IS NULL
                 ORDER BY url ASC"
            ),
            [],
        )
    }

    fn all_versions(&self) -> StatsResult<Vec<SiteVersion>> {
        let conn = self.conn()?;
        Self::query_versions(
            &conn,
            &format!(
                "SELECT {VERSION_COLUMNS} FROM site_versions
                 ORDER BY url ASC, active_start_date ASC"
            ),
            [],
        )
    }

    fn count_versions(&self) -> StatsResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM site_versions", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }

    fn count_sites(&self) -> StatsResult<usize> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(DISTINCT url) FROM site_versions", [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }
}
