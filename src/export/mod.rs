//! Windowed export
//!
//! Splits an inclusive date range into daily or hourly windows and writes
//! each non-empty window to its own file:
//!
//! - **types**: Core data structures (TimeRange, Window, Point, ...)
//! - **window**: Window enumeration and date parsing
//! - **filename**: Deterministic output filenames
//! - **writer**: Skip-or-write decision and JSON/CSV serialization
//! - **runner**: Run controller tying the pieces to a data source
//! - **error**: Error types
//!
//! # Flow
//!
//! ```text
//! for each window:
//!   DataSource::query_window → derive_filename → ExportWriter::write
//!                                                  ├─ empty    → skip
//!                                                  ├─ exists   → skip
//!                                                  └─ otherwise → temp file → rename
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use influx_export::export::{ExportPlan, ExportRunner, Granularity, OutputFormat, parse_date};
//! use influx_export::source::{InfluxClient, InfluxConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = InfluxClient::new(InfluxConfig::new("localhost", 8086, false, "telegraf"))?;
//!     let plan = ExportPlan::new("cpu", parse_date("2023-01-01")?, parse_date("2023-01-02")?)
//!         .granularity(Granularity::Hourly)
//!         .format(OutputFormat::Csv);
//!
//!     let summary = ExportRunner::new(client, plan, ".").run().await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod filename;
pub mod runner;
pub mod types;
pub mod window;
pub mod writer;

pub use error::ExportError;
pub use filename::derive_filename;
pub use runner::{ExportPlan, ExportRunner, ExportSummary, RunState};
pub use types::{
    midnight_utc, ExportResult, Granularity, OutputFormat, Point, SkipReason, TimeRange, Window,
};
pub use window::{parse_date, windows, Windows, DATE_FORMAT};
pub use writer::{encode_csv, encode_json, ExportWriter};
