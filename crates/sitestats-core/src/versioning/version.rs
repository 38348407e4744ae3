//! Site version types.
//!
//! A site is identified by its url; every add or edit produces a new
//! [`SiteVersion`] row whose `[active_start_date, active_end_date)` interval
//! records when that snapshot of the site's attributes was in effect.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Delivery model of the courses hosted on a site.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum CourseType {
    #[strum(serialize = "MOOC")]
    #[serde(rename = "MOOC")]
    Mooc,
    #[strum(serialize = "SPOC")]
    #[serde(rename = "SPOC")]
    Spoc,
    Both,
    #[default]
    Unknown,
}

impl CourseType {
    /// Convert to string for storage
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Descriptive fields of a site, copied onto every version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteAttributes {
    pub site_type: String,
    pub name: String,
    pub course_count: Option<i64>,
    pub last_checked: Option<NaiveDate>,
    pub org_type: String,
    pub github_fork: String,
    pub notes: String,
    pub course_type: CourseType,
    pub registered_user_count: Option<i64>,
    pub active_learner_count: Option<i64>,
    /// Language names, linked through the `languages` lookup table.
    pub languages: Vec<String>,
    /// Geo zone names, linked through the `geo_zones` lookup table.
    pub geographies: Vec<String>,
}

impl Default for SiteAttributes {
    fn default() -> Self {
        Self {
            site_type: "General".to_string(),
            name: String::new(),
            course_count: None,
            last_checked: None,
            org_type: String::new(),
            github_fork: String::new(),
            notes: String::new(),
            course_type: CourseType::Unknown,
            registered_user_count: None,
            active_learner_count: None,
            languages: Vec::new(),
            geographies: Vec::new(),
        }
    }
}

impl SiteAttributes {
    /// Builder: set name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: set course count
    pub fn with_course_count(mut self, count: i64) -> Self {
        self.course_count = Some(count);
        self
    }

    /// Builder: set languages
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set geographies
    pub fn with_geographies<I, S>(mut self, geographies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.geographies = geographies.into_iter().map(Into::into).collect();
        self
    }
}

/// One persisted snapshot of a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteVersion {
    /// Surrogate row id
    pub id: i64,
    /// Logical key shared by every version of the site
    pub url: String,
    /// When this version became effective
    pub active_start_date: DateTime<Utc>,
    /// When this version stopped being effective; `None` while current
    pub active_end_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub attributes: SiteAttributes,
}

impl SiteVersion {
    /// Whether this is the open-ended version of its site.
    pub fn is_current(&self) -> bool {
        self.active_end_date.is_none()
    }

    /// Whether `ts` falls inside the half-open validity interval.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.active_start_date <= ts && self.active_end_date.map_or(true, |end| ts < end)
    }

    /// Whether the validity interval intersects `[from, to)`.
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.active_start_date < to && self.active_end_date.map_or(true, |end| end > from)
    }

    /// Interval view used by the insertion planner.
    pub fn span(&self) -> VersionSpan {
        VersionSpan {
            id: self.id,
            start: self.active_start_date,
            end: self.active_end_date,
        }
    }
}

/// Edit-path guard: history is immutable, so only the current version may
/// be used as the base of a new version. Returns `true` when the edit must
/// be rejected.
pub fn reject_edit_of_noncurrent(version: &SiteVersion) -> bool {
    !version.is_current()
}

/// Validity interval of a stored version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionSpan {
    pub id: i64,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// Summary of the version history of one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSummary {
    pub url: String,
    pub total_versions: u32,
    pub first_start: DateTime<Utc>,
    pub latest_start: DateTime<Utc>,
    /// Id of the open-ended version, if the site has one
    pub current_id: Option<i64>,
}

impl VersionSummary {
    /// Summarize an ascending history. Returns `None` for an empty slice.
    pub fn from_history(history: &[SiteVersion]) -> Option<Self> {
        let first = history.first()?;
        let last = history.last()?;
        Some(Self {
            url: first.url.clone(),
            total_versions: history.len() as u32,
            first_start: first.active_start_date,
            latest_start: last.active_start_date,
            current_id: history.iter().find(|v| v.is_current()).map(|v| v.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn version(id: i64, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> SiteVersion {
        SiteVersion {
            id,
            url: "https://a.com".to_string(),
            active_start_date: start,
            active_end_date: end,
            attributes: SiteAttributes::default(),
        }
    }

    #[test]
    fn test_course_type_strings() {
        assert_eq!(CourseType::Mooc.as_str(), "MOOC");
        assert_eq!(CourseType::from_str("SPOC").unwrap(), CourseType::Spoc);
        assert_eq!(CourseType::default(), CourseType::Unknown);
        assert!(CourseType::from_str("Hybrid").is_err());
        assert_eq!(
            serde_json::to_string(&CourseType::Both).unwrap(),
            "\"Both\""
        );
    }

    #[test]
    fn test_default_attributes() {
        let attrs = SiteAttributes::default();
        assert_eq!(attrs.site_type, "General");
        assert_eq!(attrs.course_type, CourseType::Unknown);
        assert!(attrs.languages.is_empty());
    }

    #[test]
    fn test_half_open_containment() {
        let v = version(1, at(2016, 1, 1), Some(at(2016, 2, 1)));
        assert!(v.contains(at(2016, 1, 1)));
        assert!(v.contains(at(2016, 1, 31)));
        assert!(!v.contains(at(2016, 2, 1)));
        assert!(!v.contains(at(2015, 12, 31)));

        let current = version(2, at(2016, 2, 1), None);
        assert!(current.contains(at(2030, 1, 1)));
    }

    #[test]
    fn test_reject_edit_of_noncurrent() {
        assert!(reject_edit_of_noncurrent(&version(
            1,
            at(2016, 1, 1),
            Some(at(2016, 2, 1))
        )));
        assert!(!reject_edit_of_noncurrent(&version(2, at(2016, 2, 1), None)));
    }

    #[test]
    fn test_summary_from_history() {
        let history = vec![
            version(1, at(2016, 1, 1), Some(at(2016, 2, 1))),
            version(2, at(2016, 2, 1), None),
        ];
        let summary = VersionSummary::from_history(&history).unwrap();
        assert_eq!(summary.total_versions, 2);
        assert_eq!(summary.first_start, at(2016, 1, 1));
        assert_eq!(summary.current_id, Some(2));
        assert!(VersionSummary::from_history(&[]).is_none());
    }

    #[test]
    fn test_attributes_deserialize_with_defaults() {
        let attrs: SiteAttributes =
            serde_json::from_str(r#"{"name":"Edge","course_type":"MOOC"}"#).unwrap();
        assert_eq!(attrs.name, "Edge");
        assert_eq!(attrs.site_type, "General");
        assert_eq!(attrs.course_type, CourseType::Mooc);
    }
}
