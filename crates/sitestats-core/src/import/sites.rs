//! Bulk import of site versions from a spreadsheet export.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use strum::IntoEnumIterator;

use crate::catalog::split_names;
use crate::config::StoreConfig;
use crate::error::{ErrorCode, SiteStatsError, StatsResult};
use crate::import::{csv_reader, parse_count, read_header, ImportStats};
use crate::time;
use crate::versioning::{CourseType, InsertOutcome, SiteAttributes, VersionStore};

/// Columns understood by the site importer, in export order.
pub const SITE_COLUMNS: &[&str] = &[
    "site_type",
    "name",
    "url",
    "course_count",
    "last_checked",
    "org_type",
    "github_fork",
    "notes",
    "course_type",
    "registered_user_count",
    "active_learner_count",
    "language",
    "geography",
    "active_start_date",
];

const REQUIRED_COLUMNS: &[&str] = &["url"];

/// Settings for one import run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Effective time for rows with neither `active_start_date` nor `last_checked`
    pub now: DateTime<Utc>,
    /// Site type for rows that leave it blank
    pub default_site_type: String,
    /// Rows between progress log lines
    pub batch_size: usize,
}

impl ImportOptions {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::from_config(&StoreConfig::default(), now)
    }

    pub fn from_config(config: &StoreConfig, now: DateTime<Utc>) -> Self {
        Self {
            now,
            default_site_type: config.default_site_type.clone(),
            batch_size: config.import_batch_size.max(1),
        }
    }
}

/// Outcome of a site import.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SiteImportReport {
    #[serde(flatten)]
    pub stats: ImportStats,
    /// Languages created by the import
    pub languages: u64,
    /// Geo zones created by the import
    pub geozones: u64,
    /// Site/language links written
    pub site_languages: u64,
    /// Site/geo zone links written
    pub site_geozones: u64,
}

impl SiteImportReport {
    fn record(&mut self, outcome: &InsertOutcome) {
        self.stats.imported += 1;
        self.languages += u64::from(outcome.languages_created);
        self.geozones += u64::from(outcome.geozones_created);
        self.site_languages += u64::from(outcome.language_links);
        self.site_geozones += u64::from(outcome.geozone_links);
    }
}

impl fmt::Display for SiteImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nReport:")?;
        writeln!(f, "Number of sites imported: {}", self.stats.imported)?;
        writeln!(f, "Number of languages imported: {}", self.languages)?;
        writeln!(f, "Number of geozones imported: {}", self.geozones)?;
        writeln!(f, "Number of site_languages created: {}", self.site_languages)?;
        writeln!(f, "Number of site_geozones created: {}", self.site_geozones)?;
        writeln!(f, "Number of duplicate versions skipped: {}", self.stats.skipped)?;
        writeln!(f, "Number of rows rejected: {}", self.stats.rejected())?;
        for error in &self.stats.errors {
            writeln!(f, "  {}", error)?;
        }
        Ok(())
    }
}

/// One parsed data row.
#[derive(Debug)]
struct SiteRow {
    url: String,
    effective_at: DateTime<Utc>,
    attributes: SiteAttributes,
}

fn parse_course_type(cell: &str) -> StatsResult<CourseType> {
    if cell.is_empty() {
        return Ok(CourseType::default());
    }
    CourseType::from_str(cell).map_err(|_| {
        let allowed: Vec<&str> = CourseType::iter().map(|t| t.as_str()).collect();
        SiteStatsError::validation_code(
            ErrorCode::ValInvalidFormat,
            format!(
                "Unknown course_type '{}', expected one of {}",
                cell,
                allowed.join(", ")
            ),
        )
    })
}

fn parse_row(
    columns: &[String],
    record: &csv::StringRecord,
    options: &ImportOptions,
) -> StatsResult<SiteRow> {
    if record.len() > columns.len() {
        return Err(SiteStatsError::validation_code(
            ErrorCode::ValInvalidFormat,
            format!(
                "{} cells for {} columns",
                record.len(),
                columns.len()
            ),
        ));
    }

    let mut url = String::new();
    let mut start: Option<DateTime<Utc>> = None;
    let mut checked_at: Option<DateTime<Utc>> = None;
    let mut attributes = SiteAttributes {
        site_type: options.default_site_type.clone(),
        ..Default::default()
    };

    for (column, cell) in columns.iter().zip(record.iter()) {
        let cell = cell.trim();
        match column.as_str() {
            "url" => url = cell.to_string(),
            "site_type" if !cell.is_empty() => attributes.site_type = cell.to_string(),
            "name" => attributes.name = cell.to_string(),
            "course_count" => attributes.course_count = parse_count(column, cell)?,
            "last_checked" if !cell.is_empty() => {
                attributes.last_checked = Some(time::parse_date(cell)?);
                checked_at = Some(time::parse_flexible(cell)?);
            }
            "org_type" => attributes.org_type = cell.to_string(),
            "github_fork" => attributes.github_fork = cell.to_string(),
            "notes" => attributes.notes = cell.to_string(),
            "course_type" => attributes.course_type = parse_course_type(cell)?,
            "registered_user_count" => {
                attributes.registered_user_count = parse_count(column, cell)?
            }
            "active_learner_count" => {
                attributes.active_learner_count = parse_count(column, cell)?
            }
            "language" => attributes.languages = split_names(cell),
            "geography" => attributes.geographies = split_names(cell),
            "active_start_date" if !cell.is_empty() => start = Some(time::parse_flexible(cell)?),
            _ => {}
        }
    }

    if url.is_empty() {
        return Err(SiteStatsError::validation_code(
            ErrorCode::ValMissingField,
            "url is required",
        ));
    }

    Ok(SiteRow {
        url,
        effective_at: start.or(checked_at).unwrap_or(options.now),
        attributes,
    })
}

/// Import site versions from CSV.
///
/// Header problems fail the whole import before anything is written. Each
/// data row is inserted in its own transaction; a row that collides with an
/// existing version is counted as skipped, any other failure rejects only
/// that row. Rows are numbered as in a spreadsheet, the header being row 1.
pub fn import_sites<S, R>(
    store: &S,
    input: R,
    options: &ImportOptions,
) -> StatsResult<SiteImportReport>
where
    S: VersionStore + ?Sized,
    R: Read,
{
    let mut reader = csv_reader(input);
    let columns = read_header(&mut reader, SITE_COLUMNS, REQUIRED_COLUMNS)?;
    let mut report = SiteImportReport::default();

    tracing::info!(columns = columns.len(), "Begin site import");

    for (idx, record) in reader.records().enumerate() {
        let row_number = idx + 2;
        report.stats.total += 1;

        let result = record
            .map_err(SiteStatsError::from)
            .and_then(|record| parse_row(&columns, &record, options))
            .and_then(|row| {
                store.insert_version_tracked(&row.url, row.effective_at, &row.attributes)
            });

        match result {
            Ok(outcome) => report.record(&outcome),
            Err(SiteStatsError::DuplicateVersion { url, .. }) => {
                tracing::debug!(row = row_number, url = %url, "Skipping duplicate version");
                report.stats.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(row = row_number, error = %e, "Rejected import row");
                report.stats.errors.push(format!("Row {}: {}", row_number, e));
            }
        }

        if report.stats.total % options.batch_size as u64 == 0 {
            tracing::info!(processed = report.stats.total, "Site import progress");
        }
    }

    tracing::info!(
        total = report.stats.total,
        imported = report.stats.imported,
        skipped = report.stats.skipped,
        rejected = report.stats.rejected(),
        "Finished site import"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap()
    }

    fn import(store: &SqliteStore, csv: &str) -> SiteImportReport {
        import_sites(store, csv.as_bytes(), &ImportOptions::new(now())).unwrap()
    }

    #[test]
    fn test_import_counts_links_and_lookups() {
        let store = SqliteStore::in_memory().unwrap();
        let csv = "url,name,course_count,language,geography,last_checked\n\
                   https://a.com,A,10,\"English,French\",US,2016-03-24\n\
                   https://b.org,B,,English,\"US, China\",2016-03-25\n";

        let report = import(&store, csv);
        assert_eq!(report.stats.total, 2);
        assert_eq!(report.stats.imported, 2);
        assert_eq!(report.languages, 2);
        assert_eq!(report.geozones, 2);
        assert_eq!(report.site_languages, 3);
        assert_eq!(report.site_geozones, 3);
        assert!(report.stats.is_success());

        let a = store.current_version("https://a.com").unwrap().unwrap();
        assert_eq!(a.attributes.course_count, Some(10));
        assert_eq!(a.attributes.site_type, "General");
        assert_eq!(
            a.attributes.last_checked,
            NaiveDate::from_ymd_opt(2016, 3, 24)
        );
        assert_eq!(
            a.active_start_date,
            Utc.with_ymd_and_hms(2016, 3, 24, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_effective_time_precedence() {
        let store = SqliteStore::in_memory().unwrap();
        let csv = "url,last_checked,active_start_date\n\
                   https://a.com,2016-03-24,2015-01-01 08:00:00\n\
                   https://b.org,2016-03-24,\n\
                   https://c.net,,\n";
        import(&store, csv);

        let start = |url| store.current_version(url).unwrap().unwrap().active_start_date;
        assert_eq!(start("https://a.com"), Utc.with_ymd_and_hms(2015, 1, 1, 8, 0, 0).unwrap());
        assert_eq!(start("https://b.org"), Utc.with_ymd_and_hms(2016, 3, 24, 0, 0, 0).unwrap());
        assert_eq!(start("https://c.net"), now());
    }

    #[test]
    fn test_reimport_skips_duplicates() {
        let store = SqliteStore::in_memory().unwrap();
        let csv = "url,name,last_checked\nhttps://a.com,A,2016-03-24\n";
        import(&store, csv);

        let report = import(&store, csv);
        assert_eq!(report.stats.imported, 0);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(store.count_versions().unwrap(), 1);
    }

    #[test]
    fn test_bad_rows_rejected_individually() {
        let store = SqliteStore::in_memory().unwrap();
        let csv = "url,course_count,course_type\n\
                   https://a.com,ten,MOOC\n\
                   ,5,MOOC\n\
                   https://b.org,5,Hybrid\n\
                   https://c.net,5,SPOC\n";

        let report = import(&store, csv);
        assert_eq!(report.stats.total, 4);
        assert_eq!(report.stats.imported, 1);
        assert_eq!(report.stats.rejected(), 3);
        assert!(report.stats.errors[0].starts_with("Row 2:"));
        assert!(report.stats.errors[2].contains("Hybrid"));

        let c = store.current_version("https://c.net").unwrap().unwrap();
        assert_eq!(c.attributes.course_type, CourseType::Spoc);
    }

    #[test]
    fn test_header_errors_abort_before_writing() {
        let store = SqliteStore::in_memory().unwrap();
        let err = import_sites(
            &store,
            "url,favourite_colour\nhttps://a.com,blue\n".as_bytes(),
            &ImportOptions::new(now()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unrecognized column name: favourite_colour"));
        assert_eq!(store.count_versions().unwrap(), 0);
    }

    #[test]
    fn test_report_text() {
        let store = SqliteStore::in_memory().unwrap();
        let report = import(&store, "url,language\nhttps://a.com,English\n");
        let text = report.to_string();
        assert!(text.contains("Number of sites imported: 1\n"));
        assert!(text.contains("Number of languages imported: 1\n"));
        assert!(text.contains("Number of site_geozones created: 0\n"));
    }
}
