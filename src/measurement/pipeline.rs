//! Per-file processing: parse, summarize, publish

use std::path::{Path, PathBuf};

use super::{discover, parse, summarize, MeasurementFile, MeasurementGrid, StampedSummary};
use crate::clock::CaptureClock;
use crate::config::PipelineConfig;
use crate::error::{Error, ParseError, Result};
use crate::sink::{BlobSink, MetricSink, SinkGuard};

/// Outcome of one successfully published file
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub rows: usize,
    pub cols: usize,
    pub summary: StampedSummary,
}

/// A file that was left out because its data was unusable
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub kind: &'static str,
    pub reason: String,
}

impl SkippedFile {
    fn from_error(path: &Path, error: Error) -> Self {
        match error {
            Error::Parse { path, source } => Self {
                path,
                kind: source.kind(),
                reason: source.to_string(),
            },
            other => Self {
                path: path.to_path_buf(),
                kind: "other",
                reason: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub processed: Vec<FileReport>,
    pub skipped: Vec<SkippedFile>,
}

impl PipelineReport {
    /// No files were found at all
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty() && self.skipped.is_empty()
    }
}

/// Turns the measurement files in a directory into published statistics
pub struct Pipeline {
    data_dir: PathBuf,
    file_suffix: String,
    enforce_dimensions: bool,
    metrics: Box<dyn MetricSink>,
    blobs: Box<dyn BlobSink>,
    clock: CaptureClock,
}

impl Pipeline {
    pub fn new(
        config: &PipelineConfig,
        metrics: Box<dyn MetricSink>,
        blobs: Box<dyn BlobSink>,
    ) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            file_suffix: config.file_suffix.clone(),
            enforce_dimensions: config.enforce_dimensions,
            metrics,
            blobs,
            clock: CaptureClock::new(),
        }
    }

    /// Use `clock` for the timestamps attached to each file
    pub fn with_clock(mut self, clock: CaptureClock) -> Self {
        self.clock = clock;
        self
    }

    /// Process every matching file in sorted order
    ///
    /// Unusable files are skipped and reported; discovery and sink failures
    /// abort the run.
    pub fn run(&mut self) -> Result<PipelineReport> {
        let files = discover(&self.data_dir, &self.file_suffix)?;
        let mut report = PipelineReport::default();

        if files.is_empty() {
            warn!("No thermal CSV files found in {}", self.data_dir.display());
            return Ok(report);
        }

        info!("Processing {} thermal CSV files", files.len());
        for file in &files {
            match self.process_file(file) {
                Ok(file_report) => report.processed.push(file_report),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let skipped = SkippedFile::from_error(file.path(), e);
                    warn!(
                        "Skipping {} ({}): {}",
                        skipped.path.display(),
                        skipped.kind,
                        skipped.reason
                    );
                    report.skipped.push(skipped);
                }
            }
        }

        info!(
            "Pipeline finished: {} processed, {} skipped",
            report.processed.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Parse, summarize and publish a single file
    pub fn process_file(&mut self, file: &MeasurementFile) -> Result<FileReport> {
        let grid = self.load(file).map_err(|source| Error::Parse {
            path: file.path().to_path_buf(),
            source,
        })?;

        let summary = StampedSummary {
            stats: summarize(&grid),
            timestamp_ns: self.clock.now_ns(),
        };
        debug!(
            "{}: {}x{} grid, mean {:.3}",
            file.file_name(),
            grid.rows(),
            grid.cols(),
            summary.stats.mean
        );

        self.publish(file.path(), &summary)?;

        Ok(FileReport {
            path: file.path().to_path_buf(),
            rows: grid.rows(),
            cols: grid.cols(),
            summary,
        })
    }

    fn load(&self, file: &MeasurementFile) -> std::result::Result<MeasurementGrid, ParseError> {
        let grid = parse(file.path())?;

        if self.enforce_dimensions {
            match file.layout() {
                Some(layout) => grid.ensure_shape(layout.rows(), layout.cols())?,
                None => debug!("{} declares no grid layout", file.file_name()),
            }
        }

        Ok(grid)
    }

    /// Upload the raw file, then the four metrics, all with one timestamp
    fn publish(&mut self, path: &Path, summary: &StampedSummary) -> Result<()> {
        let timestamp_ns = summary.timestamp_ns;

        let mut blobs = SinkGuard::open(self.blobs.as_mut())?;
        blobs.upload(path, timestamp_ns)?;
        blobs.close()?;

        let mut metrics = SinkGuard::open(self.metrics.as_mut())?;
        for (name, value) in summary.stats.metrics() {
            metrics.publish(name, value, timestamp_ns)?;
        }
        metrics.close()
    }
}
