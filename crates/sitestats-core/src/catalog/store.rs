//! Lookup-table persistence.

use rusqlite::{params, Connection};

use crate::catalog::{GeoZone, Language, Lookup};
use crate::db::SqliteStore;
use crate::error::{SiteStatsError, StatsResult};

/// Trait for language / geo zone lookup operations
pub trait CatalogStore: Send + Sync {
    /// Add a language; fails with a conflict if the name exists
    fn add_language(&self, name: &str) -> StatsResult<Language>;

    /// Add a geo zone; fails with a conflict if the name exists
    fn add_geozone(&self, name: &str) -> StatsResult<GeoZone>;

    /// All languages, sorted by name
    fn list_languages(&self) -> StatsResult<Vec<Language>>;

    /// All geo zones, sorted by name
    fn list_geozones(&self) -> StatsResult<Vec<GeoZone>>;
}

fn required_name(lookup: Lookup, name: &str) -> StatsResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SiteStatsError::validation(format!(
            "{} name is required",
            lookup.label()
        )));
    }
    Ok(name)
}

/// Insert a lookup row unless present; returns whether a row was written.
fn insert_lookup(conn: &Connection, lookup: Lookup, name: &str) -> StatsResult<bool> {
    let inserted = conn.execute(
        &format!("INSERT OR IGNORE INTO {} (name) VALUES (?1)", lookup.table()),
        params![name],
    )?;
    Ok(inserted > 0)
}

fn add_lookup(store: &SqliteStore, lookup: Lookup, name: &str) -> StatsResult<String> {
    let name = required_name(lookup, name)?;
    let conn = store.conn()?;
    if !insert_lookup(&conn, lookup, name)? {
        return Err(SiteStatsError::already_exists(lookup.label(), name));
    }
    tracing::info!(table = lookup.table(), name, "Lookup row added");
    Ok(name.to_string())
}

fn list_lookup(store: &SqliteStore, lookup: Lookup) -> StatsResult<Vec<String>> {
    let conn = store.conn()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT name FROM {} ORDER BY name ASC",
        lookup.table()
    ))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

impl CatalogStore for SqliteStore {
    fn add_language(&self, name: &str) -> StatsResult<Language> {
        add_lookup(self, Lookup::Language, name).map(|name| Language { name })
    }

    fn add_geozone(&self, name: &str) -> StatsResult<GeoZone> {
        add_lookup(self, Lookup::GeoZone, name).map(|name| GeoZone { name })
    }

    fn list_languages(&self) -> StatsResult<Vec<Language>> {
        Ok(list_lookup(self, Lookup::Language)?
            .into_iter()
            .map(|name| Language { name })
            .collect())
    }

    fn list_geozones(&self) -> StatsResult<Vec<GeoZone>> {
        Ok(list_lookup(self, Lookup::GeoZone)?
            .into_iter()
            .map(|name| GeoZone { name })
            .collect())
    }
}

/// Counts produced while linking names to a site version.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LinkCounts {
    /// Lookup rows created on the fly
    pub created: u32,
    /// Junction rows written
    pub linked: u32,
}

/// Link already-normalized `names` to a site version, creating missing
/// lookup rows. Runs on the caller's transaction.
pub(crate) fn link_names(
    conn: &Connection,
    lookup: Lookup,
    site_id: i64,
    names: &[String],
) -> StatsResult<LinkCounts> {
    let mut counts = LinkCounts::default();
    for name in names {
        counts.created += u32::from(insert_lookup(conn, lookup, name)?);
        counts.linked += conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (site_id, {}) VALUES (?1, ?2)",
                lookup.link_table(),
                lookup.link_column()
            ),
            params![site_id, name],
        )? as u32;
    }
    Ok(counts)
}

/// Names linked to a site version, in link order.
pub(crate) fn load_names(
    conn: &Connection,
    lookup: Lookup,
    site_id: i64,
) -> StatsResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM {} WHERE site_id = ?1 ORDER BY rowid ASC",
        lookup.link_column(),
        lookup.link_table()
    ))?;
    let names = stmt
        .query_map(params![site_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_add_and_list_languages() {
        let store = SqliteStore::in_memory().unwrap();
        store.add_language("French").unwrap();
        store.add_language(" English ").unwrap();

        let names: Vec<String> = store
            .list_languages()
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["English", "French"]);
    }

    #[test]
    fn test_add_language_that_already_exists() {
        let store = SqliteStore::in_memory().unwrap();
        store.add_language("ANewLanguage").unwrap();
        let err = store.add_language("ANewLanguage").unwrap_err();
        assert_eq!(err.code(), ErrorCode::CatDuplicate);
        assert!(err
            .to_string()
            .contains("Language with this Name already exists"));
    }

    #[test]
    fn test_add_geozone_that_already_exists() {
        let store = SqliteStore::in_memory().unwrap();
        store.add_geozone("ANewGeozone").unwrap();
        let err = store.add_geozone("ANewGeozone").unwrap_err();
        assert!(err.to_string().contains("Geo zone with this Name already exists"));
        assert_eq!(store.list_geozones().unwrap().len(), 1);
    }

    #[test]
    fn test_blank_name_rejected() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store.add_geozone("   ").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValInvalidInput);
    }
}
