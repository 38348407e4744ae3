//! CSV import of site versions and over-time summary snapshots.
//!
//! Both importers read a header row first and validate it as a whole
//! (required columns, no duplicates, no unknown names) before touching the
//! store. After that every data row is handled on its own: a bad row is
//! counted and reported without aborting the rest of the file.
//!
//! # Example
//!
//! ```ignore
//! use sitestats_core::import::{import_sites, ImportOptions};
//!
//! let file = std::fs::File::open("sites.csv")?;
//! let report = import_sites(&store, file, &ImportOptions::new(chrono::Utc::now()))?;
//! println!("{}", report);
//! ```

pub mod sites;
pub mod snapshots;

pub use sites::{import_sites, ImportOptions, SiteImportReport, SITE_COLUMNS};
pub use snapshots::{import_snapshots, SNAPSHOT_COLUMNS};

use serde::Serialize;
use std::io::Read;

use crate::error::{ErrorCode, SiteStatsError, StatsResult};

/// Statistics from an import operation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Total data rows processed.
    pub total: u64,
    /// Rows written to the store.
    pub imported: u64,
    /// Skipped rows (duplicates of an existing version).
    pub skipped: u64,
    /// Error messages for rejected rows.
    pub errors: Vec<String>,
}

impl ImportStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if import completed without errors.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of rejected rows.
    pub fn rejected(&self) -> u64 {
        self.errors.len() as u64
    }

    /// Get the error rate as a percentage.
    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.errors.len() as f64 / self.total as f64) * 100.0
        }
    }
}

/// Open a CSV reader that tolerates short rows.
pub(crate) fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}

/// Read and validate the header row.
///
/// Column names are lower-cased and trimmed. Fails when the file is empty,
/// a column repeats, a column is not in `known`, or a `required` column is
/// missing.
pub(crate) fn read_header<R: Read>(
    reader: &mut csv::Reader<R>,
    known: &[&str],
    required: &[&str],
) -> StatsResult<Vec<String>> {
    let header = reader.headers()?;
    if header.is_empty() || header.iter().all(|h| h.trim().is_empty()) {
        return Err(SiteStatsError::validation_code(
            ErrorCode::ValInvalidFormat,
            "Empty or improperly configured csv",
        ));
    }

    let mut columns: Vec<String> = Vec::with_capacity(header.len());
    for raw in header.iter() {
        let name = raw.trim().to_lowercase();
        if columns.contains(&name) {
            return Err(SiteStatsError::validation_code(
                ErrorCode::ValInvalidFormat,
                format!("Duplicate column detected: {}", name),
            ));
        }
        if !known.contains(&name.as_str()) {
            return Err(SiteStatsError::validation_code(
                ErrorCode::ValUnknownColumn,
                format!("Unrecognized column name: {}", name),
            ));
        }
        columns.push(name);
    }

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|r| !columns.iter().any(|c| c == r))
        .collect();
    if !missing.is_empty() {
        return Err(SiteStatsError::validation_code(
            ErrorCode::ValMissingField,
            format!("Missing required cols in csv file: {:?}", missing),
        ));
    }
    Ok(columns)
}

/// Parse an optional integer cell; blank cells are `None`.
pub(crate) fn parse_count(column: &str, cell: &str) -> StatsResult<Option<i64>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<i64>().map(Some).map_err(|_| SiteStatsError::Parse {
        message: format!("{} must be a whole number, got '{}'", column, cell),
        code: ErrorCode::ParseInvalidNumber,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: &[&str] = &["url", "name", "notes"];

    fn header(csv: &str) -> StatsResult<Vec<String>> {
        let mut reader = csv_reader(csv.as_bytes());
        read_header(&mut reader, KNOWN, &["url"])
    }

    #[test]
    fn test_header_normalized() {
        assert_eq!(header(" URL ,Name\n").unwrap(), vec!["url", "name"]);
    }

    #[test]
    fn test_header_errors() {
        assert_eq!(header("").unwrap_err().code(), ErrorCode::ValInvalidFormat);
        assert_eq!(
            header("url,URL\n").unwrap_err().code(),
            ErrorCode::ValInvalidFormat
        );
        assert_eq!(
            header("url,colour\n").unwrap_err().code(),
            ErrorCode::ValUnknownColumn
        );
        assert_eq!(
            header("name,notes\n").unwrap_err().code(),
            ErrorCode::ValMissingField
        );
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("n", " 12 ").unwrap(), Some(12));
        assert_eq!(parse_count("n", "").unwrap(), None);
        assert_eq!(
            parse_count("n", "twelve").unwrap_err().code(),
            ErrorCode::ParseInvalidNumber
        );
    }

    #[test]
    fn test_stats_error_rate() {
        let stats = ImportStats {
            total: 4,
            imported: 3,
            skipped: 0,
            errors: vec!["Row 2: bad".to_string()],
        };
        assert!(!stats.is_success());
        assert_eq!(stats.rejected(), 1);
        assert_eq!(stats.error_rate(), 25.0);
        assert_eq!(ImportStats::new().error_rate(), 0.0);
    }
}
