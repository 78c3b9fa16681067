//! Output filename derivation
//!
//! `data_{measurement}_{timestamp}.{ext}`, where the timestamp is the window
//! start formatted to the granularity's precision. The same inputs always
//! produce the same name, which is what makes reruns skip finished windows.

use chrono::{DateTime, Utc};

use super::types::{Granularity, OutputFormat};

pub fn derive_filename(
    measurement: &str,
    window_start: DateTime<Utc>,
    granularity: Granularity,
    format: OutputFormat,
) -> String {
    format!(
        "data_{}_{}.{}",
        measurement,
        window_start.format(granularity.timestamp_format()),
        format.extension()
    )
}
