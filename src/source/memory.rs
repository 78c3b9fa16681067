//! In-memory data source

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{DataSource, SourceError};
use crate::export::{Point, Window};

/// Data source backed by points held in memory
///
/// Points are returned in timestamp order; points sharing a timestamp keep
/// their insertion order. Each returned point starts with a `time` field
/// holding its RFC 3339 timestamp, the way InfluxDB returns rows.
pub struct MemorySource {
    database: String,
    measurements: RwLock<HashMap<String, Vec<(DateTime<Utc>, Point)>>>,
    unreachable: bool,
    failing_queries: bool,
    queries: AtomicUsize,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self {
            database: "memory".to_string(),
            measurements: RwLock::default(),
            unreachable: false,
            failing_queries: false,
            queries: AtomicUsize::new(0),
        }
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: name reported as the source's database
    pub fn with_database(mut self, name: impl Into<String>) -> Self {
        self.database = name.into();
        self
    }

    /// Source whose ping and queries fail as if the server were down
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Source that answers pings but rejects every query
    pub fn rejecting_queries() -> Self {
        Self {
            failing_queries: true,
            ..Self::default()
        }
    }

    /// Add a point to `measurement` at `timestamp`
    pub fn insert(&self, measurement: &str, timestamp: DateTime<Utc>, fields: Point) {
        let mut point = Point::new().field(
            "time",
            timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        for (name, value) in fields.into_inner() {
            point.insert(name, value);
        }

        let mut measurements = self
            .measurements
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let series = measurements.entry(measurement.to_string()).or_default();
        let idx = series.partition_point(|(ts, _)| *ts <= timestamp);
        series.insert(idx, (timestamp, point));
    }

    /// Builder form of [`MemorySource::insert`]
    pub fn with_point(self, measurement: &str, timestamp: DateTime<Utc>, fields: Point) -> Self {
        self.insert(measurement, timestamp, fields);
        self
    }

    /// Number of window queries served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DataSource for MemorySource {
    fn describe(&self) -> String {
        "in-memory source".to_string()
    }

    fn database(&self) -> &str {
        &self.database
    }

    async fn ping(&self) -> Result<(), SourceError> {
        if self.unreachable {
            return Err(SourceError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    async fn query_window(
        &self,
        measurement: &str,
        window: &Window,
    ) -> Result<Vec<Point>, SourceError> {
        self.queries.fetch_add(1, Ordering::Relaxed);

        if self.unreachable {
            return Err(SourceError::Unavailable("connection refused".to_string()));
        }
        if self.failing_queries {
            return Err(SourceError::Query(format!(
                "measurement {} cannot be queried",
                measurement
            )));
        }

        let measurements = self
            .measurements
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        Ok(measurements
            .get(measurement)
            .map(|series| {
                series
                    .iter()
                    .filter(|(ts, _)| window.contains(*ts))
                    .map(|(_, point)| point.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Granularity;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn test_query_window_filters_half_open() {
        let source = MemorySource::new()
            .with_point("cpu", at(5, 0), Point::new().field("value", 1))
            .with_point("cpu", at(5, 59), Point::new().field("value", 2))
            .with_point("cpu", at(6, 0), Point::new().field("value", 3))
            .with_point("mem", at(5, 30), Point::new().field("value", 4));

        let window = Window::starting_at(at(5, 0), Granularity::Hourly);
        let points = source.query_window("cpu", &window).await.unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].get("value"), Some(&serde_json::json!(1)));
        assert_eq!(points[1].get("value"), Some(&serde_json::json!(2)));
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test]
    async fn test_points_sorted_and_time_first() {
        let source = MemorySource::new()
            .with_point("cpu", at(7, 0), Point::new().field("value", "late"))
            .with_point("cpu", at(6, 0), Point::new().field("value", "early"));

        let window = Window::starting_at(at(0, 0), Granularity::Daily);
        let points = source.query_window("cpu", &window).await.unwrap();

        assert_eq!(points[0].get("value"), Some(&serde_json::json!("early")));
        let names: Vec<&str> = points[0].field_names().collect();
        assert_eq!(names, vec!["time", "value"]);
        assert_eq!(
            points[0].get("time"),
            Some(&serde_json::json!("2023-01-01T06:00:00Z"))
        );
    }

    #[test]
    fn test_database_name() {
        assert_eq!(DataSource::database(&MemorySource::new()), "memory");
        let source = MemorySource::new().with_database("telegraf");
        assert_eq!(DataSource::database(&source), "telegraf");
    }

    #[tokio::test]
    async fn test_unknown_measurement_is_empty() {
        let source = MemorySource::new();
        let window = Window::starting_at(at(0, 0), Granularity::Daily);
        assert!(source.query_window("nope", &window).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_modes() {
        let window = Window::starting_at(at(0, 0), Granularity::Daily);

        let down = MemorySource::unreachable();
        assert!(matches!(down.ping().await, Err(SourceError::Unavailable(_))));

        let rejecting = MemorySource::rejecting_queries();
        assert!(rejecting.ping().await.is_ok());
        assert!(matches!(
            rejecting.query_window("cpu", &window).await,
            Err(SourceError::Query(_))
        ));
    }
}
