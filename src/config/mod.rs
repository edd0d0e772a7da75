//! Configuration management for thermocap
//!
//! Holds the on-disk configuration model (camera, capture, pipeline and
//! sink sections) and converts it into the runtime settings consumed by the
//! capture supervisor and the measurement pipeline.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::capture::CaptureSettings;

/// File name suffix written by the camera's thermal export
pub const DEFAULT_FILE_SUFFIX: &str = "_336x252_14bit.thermal.celsius.csv";

/// Main configuration structure for thermocap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera connection settings
    pub camera: CameraConfig,

    /// Capture supervisor settings
    pub capture: CaptureConfig,

    /// Measurement pipeline settings
    pub pipeline: PipelineConfig,

    /// Publish/upload sink settings
    pub sinks: SinkConfig,
}

/// Camera connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera hostname or IP address
    pub host: String,

    /// Path to the external capture binary
    pub binary: PathBuf,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            host: "camera-pt-rgbt-mobotix".to_string(),
            binary: PathBuf::from("/thermal-raw"),
        }
    }
}

/// Capture supervisor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture stops once a reported frame index exceeds this value
    pub frame_target: u64,

    /// Wall-clock limit for the whole capture attempt
    pub hard_timeout_secs: u64,

    /// How long a single poll waits for output
    pub poll_interval_ms: u64,

    /// Consecutive end-of-stream reads tolerated while the process is alive
    pub max_empty_reads: u32,

    /// Grace period between SIGTERM and SIGKILL
    pub terminate_grace_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_target: 1,
            hard_timeout_secs: 120,
            poll_interval_ms: 5000,
            max_empty_reads: 3,
            terminate_grace_ms: 2000,
        }
    }
}

impl CaptureConfig {
    /// Runtime settings for the capture supervisor
    pub fn settings(&self) -> CaptureSettings {
        CaptureSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_empty_reads: self.max_empty_reads,
            terminate_grace: Duration::from_millis(self.terminate_grace_ms),
        }
    }

    pub fn hard_timeout(&self) -> Duration {
        Duration::from_secs(self.hard_timeout_secs)
    }
}

/// Measurement pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory the capture binary writes into and the pipeline reads from
    pub data_dir: PathBuf,

    /// Suffix identifying measurement files
    pub file_suffix: String,

    /// Reject grids whose shape disagrees with the file name
    pub enforce_dimensions: bool,

    /// Remove stale files from `data_dir` before capturing
    pub clean_before_capture: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/data"),
            file_suffix: DEFAULT_FILE_SUFFIX.to_string(),
            enforce_dimensions: true,
            clean_before_capture: true,
        }
    }
}

/// Publish/upload sink settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Log every metric and upload through tracing
    pub log_metrics: bool,

    /// Append metrics as JSON lines to this file
    pub metrics_file: Option<PathBuf>,

    /// Copy uploaded measurement files into this directory
    pub outbox_dir: Option<PathBuf>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            log_metrics: true,
            metrics_file: None,
            outbox_dir: None,
        }
    }
}
