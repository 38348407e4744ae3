//! Reporting over the site history.
//!
//! - [`daily_snapshots`] derives per-day site and course counts from stored
//!   versions with plain interval scans
//! - [`SnapshotStore`] keeps imported over-time summary rows

mod daily;
mod snapshot;

pub use daily::{daily_snapshots, DailySnapshot, MAX_RANGE_DAYS};
pub use snapshot::{SiteSummarySnapshot, SnapshotStore};
