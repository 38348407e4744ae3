//! Import of over-time summary data (`when, sites, courses, ...`).

use std::io::Read;

use crate::error::{ErrorCode, SiteStatsError, StatsResult};
use crate::import::{csv_reader, parse_count, read_header, ImportStats};
use crate::stats::SnapshotStore;
use crate::time;

/// Columns understood by the snapshot importer.
pub const SNAPSHOT_COLUMNS: &[&str] = &[
    "when",
    "sites",
    "courses",
    "reasons for discrepencies",
    "courses-per-site",
];

const REQUIRED_COLUMNS: &[&str] = &["when", "sites", "courses", "reasons for discrepencies"];

fn required_count(column: &str, cell: &str) -> StatsResult<i64> {
    parse_count(column, cell)?.ok_or_else(|| {
        SiteStatsError::validation_code(
            ErrorCode::ValMissingField,
            format!("{} is required", column),
        )
    })
}

/// Import summary snapshots from CSV.
///
/// `courses-per-site` is accepted and ignored since it is derived from the
/// other two counts.
pub fn import_snapshots<S, R>(store: &S, input: R) -> StatsResult<ImportStats>
where
    S: SnapshotStore + ?Sized,
    R: Read,
{
    let mut reader = csv_reader(input);
    let columns = read_header(&mut reader, SNAPSHOT_COLUMNS, REQUIRED_COLUMNS)?;
    let mut stats = ImportStats::new();

    for (idx, record) in reader.records().enumerate() {
        let row_number = idx + 2;
        stats.total += 1;

        let result = record.map_err(SiteStatsError::from).and_then(|record| {
            let cell = |name: &str| {
                columns
                    .iter()
                    .position(|c| c == name)
                    .and_then(|i| record.get(i))
                    .unwrap_or("")
                    .trim()
                    .to_string()
            };
            let when = cell("when");
            if when.is_empty() {
                return Err(SiteStatsError::validation_code(
                    ErrorCode::ValMissingField,
                    "when is required",
                ));
            }
            store.add_snapshot(
                time::parse_flexible(&when)?,
                required_count("sites", &cell("sites"))?,
                required_count("courses", &cell("courses"))?,
                &cell("reasons for discrepencies"),
            )
        });

        match result {
            Ok(_) => stats.imported += 1,
            Err(e) => {
                tracing::warn!(row = row_number, error = %e, "Rejected snapshot row");
                stats.errors.push(format!("Row {}: {}", row_number, e));
            }
        }
    }

    tracing::info!(
        total = stats.total,
        imported = stats.imported,
        "Number of snapshots imported: {}",
        stats.imported
    );
    Ok(stats)
}
