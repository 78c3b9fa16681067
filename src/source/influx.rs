//! InfluxDB 1.x HTTP client
//!
//! Talks to the `/ping` and `/query` endpoints. Query results come back as
//! `results[].series[]` blocks of `columns` + `values` rows, which are
//! flattened into points in series, row and column order.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use super::{select_window_query, DataSource, SourceError};
use crate::export::{Point, Window};

/// Connection settings for an InfluxDB server
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base URL (e.g., "http://localhost:8086")
    pub base_url: String,
    /// Database every query runs against
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Whole-request limit in seconds, body download included; 0 means none
    pub timeout_secs: u64,
    /// Limit on establishing the TCP/TLS connection, in seconds
    pub connect_timeout_secs: u64,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8086".to_string(),
            database: String::new(),
            username: None,
            password: None,
            timeout_secs: 0,
            connect_timeout_secs: 10,
        }
    }
}

impl InfluxConfig {
    /// Settings for `host:port`, selecting `database`
    pub fn new(host: &str, port: u16, ssl: bool, database: impl Into<String>) -> Self {
        let scheme = if ssl { "https" } else { "http" };
        Self {
            base_url: format!("{}://{}:{}", scheme, host, port),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Builder: set basic credentials; empty strings are ignored
    pub fn credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username.filter(|u| !u.is_empty());
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    /// Builder: set the whole-request timeout (0 disables it)
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Builder: set the connect timeout
    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Whole-request timeout, if one is set
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// InfluxDB query client
pub struct InfluxClient {
    client: Client,
    config: InfluxConfig,
}

impl InfluxClient {
    pub fn new(config: InfluxConfig) -> Result<Self, SourceError> {
        let mut builder =
            Client::builder().connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Run a raw InfluxQL statement against the configured database
    pub async fn query(&self, q: &str) -> Result<Vec<Point>, SourceError> {
        let url = format!("{}/query", self.config.base_url);

        let mut params: Vec<(&str, &str)> = vec![("db", self.config.database.as_str()), ("q", q)];
        if let Some(username) = &self.config.username {
            params.push(("u", username.as_str()));
        }
        if let Some(password) = &self.config.password {
            params.push(("p", password.as_str()));
        }

        tracing::debug!(database = %self.config.database, query = %q, "Executing InfluxQL query");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        points_from_response(body)
    }
}

#[async_trait]
impl DataSource for InfluxClient {
    fn describe(&self) -> String {
        format!("{} (database {})", self.config.base_url, self.config.database)
    }

    fn database(&self) -> &str {
        &self.config.database
    }

    async fn ping(&self) -> Result<(), SourceError> {
        let url = format!("{}/ping", self.config.base_url);

        let response = self.client.get(&url).send().await.map_err(send_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(SourceError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            })
        }
    }

    async fn query_window(
        &self,
        measurement: &str,
        window: &Window,
    ) -> Result<Vec<Point>, SourceError> {
        self.query(&select_window_query(measurement, window)).await
    }
}

fn send_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_connect() {
        SourceError::Unavailable(e.to_string())
    } else {
        SourceError::Request(e)
    }
}

/// Pull the `error` field out of an InfluxDB error body, falling back to the raw text
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ============================================
// Response DTOs
// ============================================

/// Body of a `/query` response
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Series>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    tags: Map<String, Value>,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Flatten a query response into points
///
/// Each row becomes one point whose fields are the series columns in order,
/// followed by any series tags not already present as columns.
pub fn points_from_response(response: QueryResponse) -> Result<Vec<Point>, SourceError> {
    if let Some(error) = response.error {
        return Err(SourceError::Query(error));
    }

    let mut points = Vec::new();
    for statement in response.results {
        if let Some(error) = statement.error {
            return Err(SourceError::Query(error));
        }

        for series in statement.series {
            for row in series.values {
                if row.len() != series.columns.len() {
                    return Err(SourceError::Decode(format!(
                        "row has {} values for {} columns",
                        row.len(),
                        series.columns.len()
                    )));
                }

                let mut point: Point = series.columns.iter().cloned().zip(row).collect();
                for (tag, value) in &series.tags {
                    if point.get(tag).is_none() {
                        point.insert(tag.clone(), value.clone());
                    }
                }
                points.push(point);
            }
        }
    }

    Ok(points)
}
