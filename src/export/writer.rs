//! Export writer
//!
//! Decides whether a window's points are written and persists them.
//!
//! - No points: skipped, the filesystem is not touched.
//! - Target already present: skipped, the existing file is left as is.
//! - Otherwise the points are encoded in full, written to a temporary file in
//!   the target directory and renamed into place without clobbering, so a
//!   file is either completely present or absent.

use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::error::ExportError;
use super::types::{ExportResult, OutputFormat, Point, SkipReason};

/// Writes window results into a directory in one output format
#[derive(Debug, Clone)]
pub struct ExportWriter {
    directory: PathBuf,
    format: OutputFormat,
}

impl ExportWriter {
    pub fn new(directory: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            directory: directory.into(),
            format,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Full path for a derived filename
    pub fn target_path(&self, filename: &str) -> PathBuf {
        self.directory.join(filename)
    }

    /// Write `points` to `filename` unless there is nothing to write or the
    /// file already exists
    pub fn write(&self, filename: &str, points: &[Point]) -> Result<ExportResult, ExportError> {
        if points.is_empty() {
            return Ok(ExportResult::Skipped(SkipReason::Empty));
        }

        let path = self.target_path(filename);
        if path.try_exists()? {
            return Ok(ExportResult::Skipped(SkipReason::FileExists(path)));
        }

        let body = match self.format {
            OutputFormat::Json => encode_json(points)?,
            OutputFormat::Csv => encode_csv(&path, points)?,
        };

        self.persist(path, &body, points.len())
    }

    fn persist(
        &self,
        path: PathBuf,
        body: &[u8],
        point_count: usize,
    ) -> Result<ExportResult, ExportError> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".influx-export-")
            .suffix(".partial")
            .tempfile_in(&self.directory)?;
        tmp.write_all(body)?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                tracing::debug!(path = %path.display(), bytes = body.len(), "Persisted export file");
                Ok(ExportResult::Written { path, point_count })
            }
            // Another writer created the file between the existence check and the rename
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Ok(ExportResult::Skipped(SkipReason::FileExists(path)))
            }
            Err(e) => Err(ExportError::Io(e.error)),
        }
    }
}

/// Encode points as a pretty-printed JSON array with four-space indentation
pub fn encode_json(points: &[Point]) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    points.serialize(&mut ser)?;
    Ok(buf)
}

/// Encode points as CSV with a header taken from the first point
///
/// Every point must carry the same field set as the first one.
pub fn encode_csv(path: &Path, points: &[Point]) -> Result<Vec<u8>, ExportError> {
    let Some(first) = points.first() else {
        return Ok(Vec::new());
    };
    let header: Vec<&str> = first.field_names().collect();

    if let Some((idx, odd)) = points
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, p)| !first.same_fields(p))
    {
        return Err(ExportError::HeterogeneousSchema {
            path: path.to_path_buf(),
            row: idx + 1,
            expected: header.iter().map(|s| s.to_string()).collect(),
            found: odd.field_names().map(str::to_string).collect(),
        });
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&header)?;
    for point in points {
        writer.write_record(header.iter().map(|name| csv_cell(point.get(name))))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Serialization(e.to_string()))
}

/// Render one field value as a CSV cell
fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
