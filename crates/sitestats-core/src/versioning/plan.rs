//! Insertion planning over an ordered version history.
//!
//! [`plan_insert`] decides, without touching storage, where a new version
//! lands in a site's history and which single existing row (if any) needs its
//! end date moved. The store applies the plan inside one transaction.

use chrono::{DateTime, Utc};

use crate::error::{SiteStatsError, StatsResult};
use crate::versioning::VersionSpan;

/// End-date change for one existing version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryUpdate {
    pub id: i64,
    pub new_end: DateTime<Utc>,
}

/// Outcome of planning an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPlan {
    /// End date of the new version; `None` makes it current.
    pub end: Option<DateTime<Utc>>,
    /// Existing version whose end moves to the new start: the current
    /// version when appending, the split predecessor when backfilling.
    pub close: Option<BoundaryUpdate>,
}

impl InsertPlan {
    /// Whether the new version becomes the current one.
    pub fn is_append(&self) -> bool {
        self.end.is_none()
    }
}

/// Plan the insertion of a version starting at `effective_at`.
///
/// `history` must be ascending by start. Fails with a duplicate-version error
/// when a version already starts at exactly `effective_at`.
///
/// A start strictly inside an existing interval splits it: the predecessor is
/// trimmed to end at `effective_at` and the new version ends where the
/// predecessor used to. A start before every version touches nothing.
pub fn plan_insert(
    url: &str,
    history: &[VersionSpan],
    effective_at: DateTime<Utc>,
) -> StatsResult<InsertPlan> {
    if history.iter().any(|v| v.start == effective_at) {
        return Err(SiteStatsError::duplicate_version(url, effective_at));
    }

    let successor = history.iter().position(|v| v.start > effective_at);
    let predecessor_idx = match successor {
        Some(0) => None,
        Some(idx) => Some(idx - 1),
        None => history.len().checked_sub(1),
    };

    let close = predecessor_idx.map(|idx| BoundaryUpdate {
        id: history[idx].id,
        new_end: effective_at,
    });

    Ok(InsertPlan {
        end: successor.map(|idx| history[idx].start),
        close,
    })
}

/// Check that an ascending history partitions time: every closed version
/// ends where the next one starts and only the last one is open-ended.
pub fn is_contiguous(history: &[VersionSpan]) -> bool {
    let linked = history
        .windows(2)
        .all(|pair| pair[0].start < pair[1].start && pair[0].end == Some(pair[1].start));
    let open_tail = history.last().map_or(true, |last| last.end.is_none());
    linked && open_tail
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn span(id: i64, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> VersionSpan {
        VersionSpan { id, start, end }
    }

    #[test]
    fn test_first_version_is_current() {
        let plan = plan_insert("u", &[], at(2016, 1, 1)).unwrap();
        assert!(plan.is_append());
        assert_eq!(plan.close, None);
    }

    #[test]
    fn test_append_closes_current() {
        let history = [span(1, at(2016, 1, 1), None)];
        let plan = plan_insert("u", &history, at(2016, 2, 1)).unwrap();
        assert_eq!(plan.end, None);
        assert_eq!(
            plan.close,
            Some(BoundaryUpdate {
                id: 1,
                new_end: at(2016, 2, 1)
            })
        );
    }

    #[test]
    fn test_backfill_before_earliest_touches_nothing() {
        let history = [span(1, at(2016, 2, 1), None)];
        let plan = plan_insert("u", &history, at(2016, 1, 1)).unwrap();
        assert_eq!(plan.end, Some(at(2016, 2, 1)));
        assert_eq!(plan.close, None);
    }

    #[test]
    fn test_backfill_inside_interval_trims_predecessor() {
        let history = [
            span(1, at(2016, 1, 1), Some(at(2016, 2, 1))),
            span(2, at(2016, 2, 1), None),
        ];
        let plan = plan_insert("u", &history, at(2016, 1, 15)).unwrap();
        assert_eq!(plan.end, Some(at(2016, 2, 1)));
        assert_eq!(
            plan.close,
            Some(BoundaryUpdate {
                id: 1,
                new_end: at(2016, 1, 15)
            })
        );
    }

    #[test]
    fn test_duplicate_start_rejected() {
        let history = [span(1, at(2016, 1, 1), None)];
        let err = plan_insert("u", &history, at(2016, 1, 1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SiteDuplicateVersion);
    }

    #[test]
    fn test_is_contiguous() {
        assert!(is_contiguous(&[]));
        assert!(is_contiguous(&[
            span(1, at(2016, 1, 1), Some(at(2016, 2, 1))),
            span(2, at(2016, 2, 1), None),
        ]));
        // Gap between versions
        assert!(!is_contiguous(&[
            span(1, at(2016, 1, 1), Some(at(2016, 1, 20))),
            span(2, at(2016, 2, 1), None),
        ]));
        // Two open-ended versions
        assert!(!is_contiguous(&[
            span(1, at(2016, 1, 1), None),
            span(2, at(2016, 2, 1), None),
        ]));
        // Closed tail
        assert!(!is_contiguous(&[span(1, at(2016, 1, 1), Some(at(2016, 2, 1)))]));
    }

    #[test]
    fn test_planned_sequences_stay_contiguous() {
        // Apply plans in memory for an out-of-order sequence of inserts.
        let starts = [
            at(2016, 3, 1),
            at(2016, 1, 1),
            at(2016, 5, 1),
            at(2016, 2, 1),
            at(2016, 4, 15),
        ];
        let mut history: Vec<VersionSpan> = Vec::new();
        for (i, start) in starts.iter().enumerate() {
            let plan = plan_insert("u", &history, *start).unwrap();
            if let Some(update) = plan.close {
                let row = history.iter_mut().find(|v| v.id == update.id).unwrap();
                row.end = Some(update.new_end);
            }
            history.push(span(i as i64 + 1, *start, plan.end));
            history.sort_by_key(|v| v.start);
            assert!(is_contiguous(&history), "broken after inserting {}", start);
        }
        assert_eq!(history.last().unwrap().start, at(2016, 5, 1));
        assert_eq!(history.iter().filter(|v| v.end.is_none()).count(), 1);
    }
}
