//! CSV export of site versions.

use std::io::Write;

use crate::error::StatsResult;
use crate::import::SITE_COLUMNS;
use crate::time;
use crate::versioning::SiteVersion;

/// Statistics from an export operation.
#[derive(Debug, Default, Clone)]
pub struct ExportStats {
    /// Versions written.
    pub exported: u64,
}

fn count_cell(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn to_record(version: &SiteVersion) -> Vec<String> {
    let attrs = &version.attributes;
    vec![
        attrs.site_type.clone(),
        attrs.name.clone(),
        version.url.clone(),
        count_cell(attrs.course_count),
        attrs
            .last_checked
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        attrs.org_type.clone(),
        attrs.github_fork.clone(),
        attrs.notes.clone(),
        attrs.course_type.to_string(),
        count_cell(attrs.registered_user_count),
        count_cell(attrs.active_learner_count),
        attrs.languages.join(","),
        attrs.geographies.join(","),
        time::to_sql(&version.active_start_date),
    ]
}

/// Export versions as CSV, one row per version, header first.
pub fn export_sites<W: Write>(versions: &[SiteVersion], writer: W) -> StatsResult<ExportStats> {
    let mut out = ::csv::Writer::from_writer(writer);
    out.write_record(SITE_COLUMNS)?;

    let mut stats = ExportStats::default();
    for version in versions {
        out.write_record(to_record(version))?;
        stats.exported += 1;
    }
    out.flush()?;

    tracing::info!(exported = stats.exported, "Exported site versions");
    Ok(stats)
}
