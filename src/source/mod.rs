//! Data sources
//!
//! A data source returns the points of a measurement that fall inside a
//! window. Two implementations are provided:
//!
//! - [`InfluxClient`]: InfluxDB 1.x over its HTTP query API
//! - [`MemorySource`]: in-process points, used by tests

mod influx;
mod memory;

pub use influx::{points_from_response, InfluxClient, InfluxConfig, QueryResponse};
pub use memory::MemorySource;

use async_trait::async_trait;
use chrono::SecondsFormat;
use thiserror::Error;

use crate::export::{Point, Window};

/// Source of time-series points for the exporter
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable description used in log lines
    fn describe(&self) -> String;

    /// Name of the database queries run against
    fn database(&self) -> &str;

    /// Check that the source is reachable
    async fn ping(&self) -> Result<(), SourceError>;

    /// All points of `measurement` with a timestamp in `[window.start, window.end)`,
    /// in the order the source returns them
    async fn query_window(&self, measurement: &str, window: &Window)
        -> Result<Vec<Point>, SourceError>;
}

/// InfluxQL selecting every field of `measurement` inside `window`
///
/// The measurement is inserted verbatim so qualified names such as
/// `"db"."rp"."cpu"` pass through untouched.
pub fn select_window_query(measurement: &str, window: &Window) -> String {
    format!(
        "SELECT * FROM {} WHERE time >= '{}' AND time < '{}'",
        measurement,
        window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

/// Errors that can occur when talking to a data source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Query rejected: {0}")]
    Query(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Granularity;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_select_window_query() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 5, 0, 0).unwrap();
        let window = Window::starting_at(start, Granularity::Hourly);

        assert_eq!(
            select_window_query("cpu", &window),
            "SELECT * FROM cpu WHERE time >= '2023-01-01T05:00:00Z' AND time < '2023-01-01T06:00:00Z'"
        );
    }

    #[test]
    fn test_select_window_query_daily() {
        let start = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
        let window = Window::starting_at(start, Granularity::Daily);

        assert!(select_window_query("\"autogen\".\"mem\"", &window).ends_with(
            "FROM \"autogen\".\"mem\" WHERE time >= '2023-12-31T00:00:00Z' AND time < '2024-01-01T00:00:00Z'"
        ));
    }
}
