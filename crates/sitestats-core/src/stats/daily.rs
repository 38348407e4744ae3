//! Daily site and course counts derived from version intervals.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{SiteStatsError, StatsResult};
use crate::time;
use crate::versioning::SiteVersion;

/// Longest range accepted by [`daily_snapshots`].
pub const MAX_RANGE_DAYS: i64 = 3660;

/// Counts for one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    /// Distinct sites with a version in effect at some point that day
    pub num_sites: u32,
    /// Sum of `course_count` over each site's latest version that day
    pub num_courses: i64,
}

/// Compute one snapshot per day in `from..=to`.
///
/// A version counts towards a day when its half-open interval intersects
/// `[day 00:00, next day 00:00)`. When several versions of a site touch the
/// same day, the one that started last supplies the course count; a missing
/// count contributes zero.
pub fn daily_snapshots(
    versions: &[SiteVersion],
    from: NaiveDate,
    to: NaiveDate,
) -> StatsResult<Vec<DailySnapshot>> {
    let from = time::storable_day(from)?;
    let to = time::storable_day(to)?;
    if from > to {
        return Err(SiteStatsError::validation(format!(
            "Range start {} is after range end {}",
            from, to
        )));
    }
    let days = (to - from).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(SiteStatsError::validation_with_suggestion(
            format!("Range of {} days is too long", days),
            format!("Request at most {} days at a time", MAX_RANGE_DAYS),
        ));
    }

    let mut out = Vec::with_capacity(days as usize);
    let mut day = from;
    while day <= to {
        let start = time::start_of_day(day);
        let end = start.checked_add_signed(Duration::days(1)).ok_or_else(|| {
            SiteStatsError::validation(format!("No day follows {}", day))
        })?;

        let mut latest: HashMap<&str, &SiteVersion> = HashMap::new();
        for version in versions.iter().filter(|v| v.overlaps(start, end)) {
            latest
                .entry(version.url.as_str())
                .and_modify(|seen| {
                    if version.active_start_date > seen.active_start_date {
                        *seen = version;
                    }
                })
                .or_insert(version);
        }

        out.push(DailySnapshot {
            date: day,
            num_sites: latest.len() as u32,
            num_courses: latest
                .values()
                .map(|v| v.attributes.course_count.unwrap_or(0))
                .sum(),
        });

        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::SiteAttributes;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn version(
        id: i64,
        url: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        courses: Option<i64>,
    ) -> SiteVersion {
        SiteVersion {
            id,
            url: url.to_string(),
            active_start_date: start,
            active_end_date: end,
            attributes: SiteAttributes {
                course_count: courses,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_counts_follow_intervals() {
        let versions = vec![
            version(1, "a", at(2016, 1, 1, 0), Some(at(2016, 1, 3, 12)), Some(10)),
            version(2, "a", at(2016, 1, 3, 12), None, Some(15)),
            version(3, "b", at(2016, 1, 2, 0), None, None),
        ];

        let days = daily_snapshots(&versions, date(2016, 1, 1), date(2016, 1, 4)).unwrap();
        let counts: Vec<(u32, i64)> = days.iter().map(|d| (d.num_sites, d.num_courses)).collect();
        // Jan 3 sees both versions of "a"; the later one wins.
        assert_eq!(counts, vec![(1, 10), (2, 10), (2, 15), (2, 15)]);
        assert_eq!(days[0].date, date(2016, 1, 1));
    }

    #[test]
    fn test_version_ending_at_midnight_excluded_from_next_day() {
        let versions = vec![version(1, "a", at(2016, 1, 1, 0), Some(at(2016, 1, 2, 0)), Some(3))];
        let days = daily_snapshots(&versions, date(2016, 1, 1), date(2016, 1, 2)).unwrap();
        assert_eq!(days[0].num_sites, 1);
        assert_eq!(days[1].num_sites, 0);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(daily_snapshots(&[], date(2016, 1, 2), date(2016, 1, 1)).is_err());
        assert!(daily_snapshots(&[], date(2000, 1, 1), date(2016, 1, 1)).is_err());
        assert_eq!(
            daily_snapshots(&[], date(2016, 1, 1), date(2016, 1, 1))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_days_outside_storable_years_rejected() {
        let err = daily_snapshots(&[], NaiveDate::MAX, NaiveDate::MAX).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ValInvalidInput);
        assert!(daily_snapshots(&[], NaiveDate::MIN, NaiveDate::MIN).is_err());

        let last = daily_snapshots(&[], date(9999, 12, 31), date(9999, 12, 31)).unwrap();
        assert_eq!(last[0].num_sites, 0);
    }
}
