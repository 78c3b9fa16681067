//! Export run controller
//!
//! Drives one export run: ping the data source, then for every window in
//! increasing time order query it, derive the filename and hand the points
//! to the writer. Windows are processed strictly one at a time; each
//! window's points are dropped before the next query is issued.
//!
//! Any query or filesystem failure aborts the run. Rerunning the same
//! command resumes it, because finished windows are skipped by filename.

use chrono::NaiveDate;
use std::path::PathBuf;

use super::error::ExportError;
use super::filename::derive_filename;
use super::types::{ExportResult, Granularity, OutputFormat, SkipReason, TimeRange, Window};
use super::window::{windows, Windows};
use super::writer::ExportWriter;
use crate::source::DataSource;

/// What to export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPlan {
    pub measurement: String,
    /// First calendar day exported (inclusive)
    pub start_date: NaiveDate,
    /// Last calendar day exported (inclusive)
    pub end_date: NaiveDate,
    pub granularity: Granularity,
    pub format: OutputFormat,
}

impl ExportPlan {
    pub fn new(
        measurement: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            measurement: measurement.into(),
            start_date,
            end_date,
            granularity: Granularity::default(),
            format: OutputFormat::default(),
        }
    }

    /// Builder: set granularity
    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Builder: set output format
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Overall range, or None when the dates are reversed
    pub fn range(&self) -> Option<TimeRange> {
        TimeRange::from_dates(self.start_date, self.end_date)
    }

    pub fn windows(&self) -> Windows {
        windows(self.start_date, self.end_date, self.granularity)
    }

    pub fn filename_for(&self, window: &Window) -> String {
        derive_filename(&self.measurement, window.start, self.granularity, self.format)
    }
}

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub windows: usize,
    pub written: usize,
    pub skipped_empty: usize,
    pub skipped_existing: usize,
    pub points_written: usize,
}

impl ExportSummary {
    fn record(&mut self, result: &ExportResult) {
        self.windows += 1;
        match result {
            ExportResult::Written { point_count, .. } => {
                self.written += 1;
                self.points_written += point_count;
            }
            ExportResult::Skipped(SkipReason::Empty) => self.skipped_empty += 1,
            ExportResult::Skipped(SkipReason::FileExists(_)) => self.skipped_existing += 1,
        }
    }
}

impl std::fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} windows: {} written ({} points), {} empty, {} already present",
            self.windows, self.written, self.points_written, self.skipped_empty, self.skipped_existing
        )
    }
}

/// Runs an [`ExportPlan`] against a [`DataSource`]
pub struct ExportRunner<S> {
    source: S,
    writer: ExportWriter,
    plan: ExportPlan,
    state: RunState,
}

impl<S: DataSource> ExportRunner<S> {
    pub fn new(source: S, plan: ExportPlan, output_dir: impl Into<PathBuf>) -> Self {
        let writer = ExportWriter::new(output_dir, plan.format);
        Self {
            source,
            writer,
            plan,
            state: RunState::NotStarted,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn plan(&self) -> &ExportPlan {
        &self.plan
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Export every window of the plan
    pub async fn run(&mut self) -> Result<ExportSummary, ExportError> {
        self.state = RunState::Running;

        match self.export_windows().await {
            Ok(summary) => {
                self.state = RunState::Completed;
                tracing::info!(
                    windows = summary.windows,
                    written = summary.written,
                    skipped_empty = summary.skipped_empty,
                    skipped_existing = summary.skipped_existing,
                    points = summary.points_written,
                    "Done! {}",
                    summary
                );
                Ok(summary)
            }
            Err(e) => {
                self.state = RunState::Failed;
                tracing::error!(error = %e, "Export aborted");
                Err(e)
            }
        }
    }

    async fn export_windows(&self) -> Result<ExportSummary, ExportError> {
        tracing::info!(
            source = %self.source.describe(),
            measurement = %self.plan.measurement,
            start = %self.plan.start_date,
            end = %self.plan.end_date,
            granularity = %self.plan.granularity,
            format = %self.plan.format,
            directory = %self.writer.directory().display(),
            "Starting export"
        );

        self.source.ping().await?;

        let windows = self.plan.windows();
        if windows.len() == 0 {
            tracing::warn!(
                start = %self.plan.start_date,
                end = %self.plan.end_date,
                "Start date is after end date, nothing to export"
            );
        }

        let mut summary = ExportSummary::default();
        for window in windows {
            let points = self
                .source
                .query_window(&self.plan.measurement, &window)
                .await?;
            tracing::debug!(window = %window, points = points.len(), "Window queried");

            let filename = self.plan.filename_for(&window);
            let result = self.writer.write(&filename, &points)?;
            self.report(&window, &result);
            summary.record(&result);
        }

        Ok(summary)
    }

    fn report(&self, window: &Window, result: &ExportResult) {
        match result {
            ExportResult::Written { path, point_count } => tracing::info!(
                points = point_count,
                "Data from {}.{} extracted and saved to {} file {}.",
                self.source.database(),
                self.plan.measurement,
                self.plan.format,
                path.display()
            ),
            ExportResult::Skipped(SkipReason::Empty) => tracing::info!(
                "No data found for {} between {}. Skipping file creation.",
                self.plan.measurement,
                window
            ),
            ExportResult::Skipped(SkipReason::FileExists(path)) => tracing::error!(
                "The file {} already exists. Data not saved for this period.",
                path.display()
            ),
        }
    }
}
