//! Timestamp helpers shared by the store, importers and reporting.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings with microsecond
//! precision, so lexical order in SQLite matches chronological order. That
//! only holds for four-digit years, so writes outside 0000-9999 are refused.

use std::ops::RangeInclusive;

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, SubsecRound, TimeZone,
    Utc,
};

use crate::error::{ErrorCode, SiteStatsError, StatsResult};

/// Truncate a timestamp to the precision kept by the store.
pub fn normalize(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// Years the storage format can represent.
pub const STORABLE_YEARS: RangeInclusive<i32> = 0..=9999;

/// Normalize a timestamp that is about to be written, rejecting years the
/// storage format cannot round-trip.
pub fn storable(ts: DateTime<Utc>) -> StatsResult<DateTime<Utc>> {
    check_year(ts.year(), &ts)?;
    Ok(normalize(ts))
}

/// Reject a day outside [`STORABLE_YEARS`].
pub fn storable_day(day: NaiveDate) -> StatsResult<NaiveDate> {
    check_year(day.year(), &day)?;
    Ok(day)
}

fn check_year(year: i32, shown: &dyn std::fmt::Display) -> StatsResult<()> {
    if STORABLE_YEARS.contains(&year) {
        return Ok(());
    }
    Err(SiteStatsError::validation_with_suggestion(
        format!("Date {} is outside the supported range", shown),
        "Use a date between the years 0000 and 9999",
    ))
}

/// Format a timestamp for storage.
pub fn to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
pub fn from_sql(s: &str) -> StatsResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SiteStatsError::parse(format!("invalid stored timestamp '{}': {}", s, e)))
}

/// Midnight UTC at the start of `day`.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse a spreadsheet date or datetime cell.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` and the date-only forms
/// `YYYY-MM-DD`, `MM/DD/YYYY`, `YYYY/MM/DD`. Naive values are read as UTC and
/// bare dates resolve to midnight.
pub fn parse_flexible(input: &str) -> StatsResult<DateTime<Utc>> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(normalize(dt.with_timezone(&Utc)));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(normalize(Utc.from_utc_datetime(&naive)));
        }
    }
    parse_date(s).map(start_of_day)
}

/// Parse a date-only cell (see [`parse_flexible`] for accepted forms).
pub fn parse_date(input: &str) -> StatsResult<NaiveDate> {
    let s = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            // Datetime cells in a date column keep only their date part.
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .ok_or_else(|| SiteStatsError::Parse {
            message: format!("unrecognized date '{}'", s),
            code: ErrorCode::ParseInvalidDate,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_format_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
        let b = a + chrono::Duration::microseconds(1);
        assert_eq!(to_sql(&a), "2016-01-01T00:00:00.000000Z");
        assert_eq!(to_sql(&a).len(), to_sql(&b).len());
        assert!(to_sql(&a) < to_sql(&b));
        assert_eq!(from_sql(&to_sql(&b)).unwrap(), b);
    }

    #[test]
    fn test_storable_rejects_five_digit_years() {
        let edge = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(storable(edge).unwrap(), edge);
        assert_eq!(to_sql(&edge).len(), "2016-01-01T00:00:00.000000Z".len());

        let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(storable(far).unwrap_err().code(), ErrorCode::ValInvalidInput);
        let before = Utc.with_ymd_and_hms(-1, 12, 31, 0, 0, 0).unwrap();
        assert!(storable(before).is_err());

        assert!(storable_day(NaiveDate::MAX).is_err());
        assert!(storable_day(NaiveDate::from_ymd_opt(2016, 1, 1).unwrap()).is_ok());
    }

    #[test]
    fn test_normalize_drops_nanos() {
        let ts = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(1_500);
        assert_eq!(normalize(ts).timestamp_subsec_nanos(), 1_000);
    }

    #[test]
    fn test_parse_flexible_formats() {
        let midnight = Utc.with_ymd_and_hms(2016, 3, 24, 0, 0, 0).unwrap();
        assert_eq!(parse_flexible("2016-03-24").unwrap(), midnight);
        assert_eq!(parse_flexible("03/24/2016").unwrap(), midnight);
        assert_eq!(parse_flexible(" 2016-03-24T00:00:00Z ").unwrap(), midnight);
        assert_eq!(
            parse_flexible("2016-03-24 13:45:10").unwrap(),
            Utc.with_ymd_and_hms(2016, 3, 24, 13, 45, 10).unwrap()
        );
        assert!(parse_flexible("last tuesday").is_err());
    }

    #[test]
    fn test_parse_date() {
        let d = NaiveDate::from_ymd_opt(2016, 3, 24).unwrap();
        assert_eq!(parse_date("2016-03-24").unwrap(), d);
        assert_eq!(parse_date("2016-03-24T10:00:00+00:00").unwrap(), d);
        assert_eq!(
            parse_date("soon").unwrap_err().code(),
            ErrorCode::ParseInvalidDate
        );
    }
}
