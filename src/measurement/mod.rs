//! Measurement Pipeline
//!
//! Finds the measurement files written by a capture, parses each into a
//! [`MeasurementGrid`], summarizes it, and hands the result to the sinks.

pub mod grid;
pub mod parser;
pub mod pipeline;
pub mod stats;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

pub use grid::MeasurementGrid;
pub use parser::{is_numeric_token, parse, parse_reader};
pub use pipeline::{FileReport, Pipeline, PipelineReport, SkippedFile};
pub use stats::{summarize, StampedSummary, SummaryStatistics};

static LAYOUT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(\d+)x(\d+)_").expect("layout pattern is valid"));

/// Grid dimensions declared in a measurement file name (`_<W>x<H>_`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub width: usize,
    pub height: usize,
}

impl GridLayout {
    pub fn rows(&self) -> usize {
        self.height
    }

    pub fn cols(&self) -> usize {
        self.width
    }
}

/// A measurement file produced by the capture binary
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MeasurementFile {
    path: PathBuf,
}

impl MeasurementFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Dimensions encoded in the file name, if any
    pub fn layout(&self) -> Option<GridLayout> {
        let name = self.file_name();
        let captures = LAYOUT_PATTERN.captures(&name)?;
        let width = captures.get(1)?.as_str().parse().ok()?;
        let height = captures.get(2)?.as_str().parse().ok()?;
        Some(GridLayout { width, height })
    }
}

/// List files in `dir` whose names end with `suffix`, sorted by path
///
/// Hidden files and directories are ignored. A missing directory yields an
/// empty list.
pub fn discover(dir: &Path, suffix: &str) -> Result<Vec<MeasurementFile>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Measurement directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(Error::DiscoveryFailed {
                dir: dir.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    let mut files: Vec<MeasurementFile> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            !name.starts_with('.') && name.ends_with(suffix)
        })
        .map(|entry| MeasurementFile::new(entry.path()))
        .collect();

    files.sort();
    debug!("Discovered {} measurement files in {}", files.len(), dir.display());
    Ok(files)
}
