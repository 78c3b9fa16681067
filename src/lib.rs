//! # influx-export
//!
//! Export time-series points from InfluxDB over a date range into one file
//! per day or per hour, as JSON or CSV.
//!
//! ## Features
//!
//! - **Windowed export**: one query per daily or hourly window, in time order
//! - **Deterministic filenames**: `data_{measurement}_{YYYY_MM_DD[_HH]}.{json|csv}`
//! - **Non-destructive**: existing files are never overwritten, so a rerun
//!   resumes an interrupted export
//! - **Atomic files**: each file appears complete or not at all
//!
//! ## Modules
//!
//! - [`export`]: Windowing, filenames, writer and run controller
//! - [`source`]: Data source trait, InfluxDB client, in-memory source
//! - [`config`]: TOML + environment configuration
//! - [`logging`]: Tracing subscriber setup

pub mod config;
pub mod export;
pub mod logging;
pub mod source;

// Re-export top-level types for convenience
pub use export::{
    derive_filename, parse_date, windows, ExportError, ExportPlan, ExportResult, ExportRunner,
    ExportSummary, ExportWriter, Granularity, OutputFormat, Point, RunState, SkipReason,
    TimeRange, Window,
};

pub use source::{DataSource, InfluxClient, InfluxConfig, MemorySource, SourceError};

pub use config::{Config, ConfigError, LoggingConfig, OutputConfig, SourceConfig};
