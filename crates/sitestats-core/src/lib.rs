//! sitestats-core - Core library for sitestats.
//!
//! This crate keeps a catalog of Open edX sites with a full, immutable
//! history of every change. Each site is identified by its url; every add
//! or edit stores a new version with a half-open validity interval, and the
//! versions of a site always partition time with no gaps or overlaps.
//!
//! # Example
//!
//! ```ignore
//! use sitestats_core::{SiteAttributes, SqliteStore, VersionStore};
//!
//! let store = SqliteStore::in_memory()?;
//! store.insert_version("https://edx.org", jan_1, &SiteAttributes::default())?;
//! store.insert_version("https://edx.org", feb_1, &SiteAttributes::default().with_course_count(12))?;
//!
//! let then = store.version_at("https://edx.org", jan_15)?;
//! let now = store.current_version("https://edx.org")?;
//! ```

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod import;
pub mod stats;
pub mod time;
pub mod versioning;

// Re-export commonly used types
pub use catalog::{CatalogStore, GeoZone, Language};
pub use config::StoreConfig;
pub use db::SqliteStore;
pub use error::{ErrorCode, SiteStatsError, StatsResult};
pub use export::export_sites;
pub use import::{import_sites, import_snapshots, ImportOptions, ImportStats, SiteImportReport};
pub use stats::{daily_snapshots, DailySnapshot, SiteSummarySnapshot, SnapshotStore};
pub use versioning::{
    reject_edit_of_noncurrent, CourseType, InsertOutcome, SiteAttributes, SiteVersion,
    VersionStore, VersionSummary,
};
