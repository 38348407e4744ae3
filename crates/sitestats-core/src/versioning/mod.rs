//! Temporal versioning of site records.
//!
//! Every change to a site produces a new immutable version with a
//! half-open validity interval `[active_start_date, active_end_date)`:
//! - versions of one url never overlap and leave no gaps
//! - exactly one version per url is open-ended (current)
//! - a version may be backfilled into the past; the enclosing interval is
//!   split so the history stays contiguous
//! - superseded versions are never edited

mod plan;
mod store;
mod version;

pub use plan::{is_contiguous, plan_insert, BoundaryUpdate, InsertPlan};
pub use store::{InsertOutcome, VersionStore};
pub use version::{
    reject_edit_of_noncurrent, CourseType, SiteAttributes, SiteVersion, VersionSpan,
    VersionSummary,
};
