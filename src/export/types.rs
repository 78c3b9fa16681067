//! Core data types for the windowed exporter
//!
//! - `TimeRange`: the overall export interval
//! - `Granularity`: how the range is chunked (daily or hourly)
//! - `Window`: one chunk of the range, queried and written on its own
//! - `Point`: one record returned by the data source
//! - `OutputFormat` and `ExportResult`: what gets written and what happened

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Half-open time interval `[start, end)` covered by an export run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    /// Start instant (inclusive)
    pub start: DateTime<Utc>,
    /// End instant (exclusive)
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a time range, returning None if `start >= end`
    pub fn try_new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Range covering the inclusive calendar dates `[start_date, end_date]` (UTC)
    ///
    /// Returns None when `start_date > end_date` or the end overflows.
    pub fn from_dates(start_date: NaiveDate, end_date: NaiveDate) -> Option<Self> {
        let start = midnight_utc(start_date);
        let end = midnight_utc(end_date).checked_add_signed(Duration::days(1))?;
        Self::try_new(start, end)
    }

    /// Check if an instant falls within this range
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Number of whole calendar days covered
    pub fn days(&self) -> i64 {
        self.duration().num_days()
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Midnight UTC at the start of `date`
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Chunking unit for an export run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One window per calendar day
    #[default]
    Daily,
    /// Twenty-four one-hour windows per calendar day
    Hourly,
}

impl Granularity {
    pub fn from_hourly_flag(hourly: bool) -> Self {
        if hourly {
            Granularity::Hourly
        } else {
            Granularity::Daily
        }
    }

    /// Length of one window
    pub fn step(&self) -> Duration {
        match self {
            Granularity::Daily => Duration::days(1),
            Granularity::Hourly => Duration::hours(1),
        }
    }

    pub fn windows_per_day(&self) -> i64 {
        Duration::days(1).num_seconds() / self.step().num_seconds()
    }

    /// strftime pattern used for the timestamp part of output filenames
    pub fn timestamp_format(&self) -> &'static str {
        match self {
            Granularity::Daily => "%Y_%m_%d",
            Granularity::Hourly => "%Y_%m_%d_%H",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Daily => write!(f, "daily"),
            Granularity::Hourly => write!(f, "hourly"),
        }
    }
}

/// One contiguous, half-open sub-interval of an export range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    /// Start instant (inclusive)
    pub start: DateTime<Utc>,
    /// End instant (exclusive)
    pub end: DateTime<Utc>,
}

impl Window {
    /// Window of `granularity` length beginning at `start`
    pub fn starting_at(start: DateTime<Utc>, granularity: Granularity) -> Self {
        Self {
            start,
            end: start + granularity.step(),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} and {}", self.start, self.end)
    }
}

/// A single record returned by the data source
///
/// An ordered mapping from field name to scalar value. Field order is the
/// order the source returned and is preserved through serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Point(Map<String, Value>);

impl Point {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder method: append a field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Field names in iteration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// True if both points carry exactly the same field names, in any order
    pub fn same_fields(&self, other: &Point) -> bool {
        self.0.len() == other.0.len() && self.0.keys().all(|k| other.0.contains_key(k))
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Point {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Point {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Serialization format for exported files
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON array of objects
    #[default]
    Json,
    /// Header row followed by one row per point
    Csv,
}

impl OutputFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::Csv => write!(f, "CSV"),
        }
    }
}

/// Why a window produced no file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The query returned zero points
    Empty,
    /// The target file is already present and was left untouched
    FileExists(PathBuf),
}

/// Outcome of exporting one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportResult {
    Skipped(SkipReason),
    Written { path: PathBuf, point_count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_time_range_from_dates() {
        let range = TimeRange::from_dates(date(2023, 1, 1), date(2023, 1, 2)).unwrap();

        assert_eq!(range.start, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).unwrap());
        assert_eq!(range.days(), 2);

        assert!(TimeRange::from_dates(date(2023, 1, 2), date(2023, 1, 1)).is_none());
    }

    #[test]
    fn test_time_range_contains() {
        let range = TimeRange::from_dates(date(2023, 1, 1), date(2023, 1, 1)).unwrap();

        assert!(range.contains(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()));
        assert!(range.contains(Utc.with_ymd_and_hms(2023, 1, 1, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_granularity_steps() {
        assert_eq!(Granularity::Daily.windows_per_day(), 1);
        assert_eq!(Granularity::Hourly.windows_per_day(), 24);
        assert_eq!(Granularity::from_hourly_flag(true), Granularity::Hourly);
        assert_eq!(Granularity::from_hourly_flag(false), Granularity::Daily);
    }

    #[test]
    fn test_window_bounds() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 5, 0, 0).unwrap();
        let window = Window::starting_at(start, Granularity::Hourly);

        assert_eq!(window.end, Utc.with_ymd_and_hms(2023, 1, 1, 6, 0, 0).unwrap());
        assert!(window.contains(start));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn test_point_preserves_field_order() {
        let point = Point::new()
            .field("time", "2023-01-01T05:00:00Z")
            .field("value", 0.5)
            .field("host", "server01");

        let names: Vec<&str> = point.field_names().collect();
        assert_eq!(names, vec!["time", "value", "host"]);

        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(
            json,
            r#"{"time":"2023-01-01T05:00:00Z","value":0.5,"host":"server01"}"#
        );
    }

    #[test]
    fn test_point_same_fields() {
        let a = Point::new().field("time", 1).field("value", 2);
        let b = Point::new().field("value", 3).field("time", 4);
        let c = Point::new().field("time", 1).field("other", json!(null));

        assert!(a.same_fields(&b));
        assert!(!a.same_fields(&c));
        assert!(!a.same_fields(&Point::new().field("time", 1)));
    }

    #[test]
    fn test_output_format() {
        assert_eq!(OutputFormat::Json.extension(), "json");
        assert_eq!(OutputFormat::Csv.extension(), "csv");
        assert_eq!(OutputFormat::Csv.to_string(), "CSV");
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
    }
}
