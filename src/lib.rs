//! thermocap - thermal camera capture and measurement summaries
//!
//! A run has two stages that only meet through the filesystem:
//!
//! 1. **Capture:** launch the camera's capture binary, follow its progress
//!    output and stop once enough frames have been reported, all under a
//!    hard wall-clock deadline.
//! 2. **Pipeline:** find the measurement files the capture wrote, parse each
//!    into a grid, compute mean / std-dev / min / max and publish them.
//!
//! ## Module Organization
//!
//! - [`capture`] - Capture supervisor, subprocess handling, progress parsing
//! - [`measurement`] - Discovery, parsing, statistics and the pipeline
//! - [`sink`] - Metric and blob sinks the pipeline publishes to
//! - [`config`] - Configuration model and file loading
//! - [`credentials`] - Camera credentials from the environment
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Failure Policy
//!
//! - Capture failures (timeout, process exit) end the run: without a capture
//!   there is nothing to analyse
//! - A measurement file that cannot be parsed is logged and skipped
//! - Missing credentials are reported before anything touches the camera

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod capture;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod measurement;
pub mod sink;
pub mod workdir;

use tracing::Instrument;
use uuid::Uuid;

pub use capture::{CaptureOutcome, CaptureSession, CaptureSettings, CaptureState, CaptureSupervisor};
pub use config::loader::ConfigLoader;
pub use config::Config;
pub use credentials::Credentials;
pub use error::{CaptureError, Error, ParseError, Result};
pub use measurement::{MeasurementGrid, Pipeline, PipelineReport, SummaryStatistics};

/// The current version of thermocap from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Result of a complete run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    /// `None` when capture was skipped
    pub capture: Option<CaptureOutcome>,
    pub pipeline: PipelineReport,
}

/// Capture, then process whatever the capture produced
pub async fn run(config: &Config, credentials: &Credentials) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    async move {
        info!("Starting {} v{}", NAME, VERSION);
        let capture = capture_stage(config, credentials).await?;
        let pipeline = pipeline_stage(config)?;
        Ok(RunReport {
            run_id,
            capture: Some(capture),
            pipeline,
        })
    }
    .instrument(info_span!("run", %run_id))
    .await
}

/// Process existing measurement files without capturing
pub fn run_pipeline_only(config: &Config) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let _span = info_span!("run", %run_id).entered();
    let pipeline = pipeline_stage(config)?;
    Ok(RunReport {
        run_id,
        capture: None,
        pipeline,
    })
}

/// Clean the working directory if configured, then capture
pub async fn capture_stage(config: &Config, credentials: &Credentials) -> Result<CaptureOutcome> {
    let data_dir = &config.pipeline.data_dir;
    if config.pipeline.clean_before_capture {
        workdir::clear_files(data_dir)?;
    }

    let session = CaptureSession::new(
        config.camera.host.clone(),
        credentials.clone(),
        data_dir.clone(),
        config.capture.frame_target,
        config.capture.hard_timeout(),
    );

    let mut supervisor = CaptureSupervisor::new(&config.camera.binary, config.capture.settings());
    match supervisor.capture(&session).await {
        Ok(outcome) => {
            info!(
                "Capture complete: frame {} after {:?} ({} lines, {} stalls)",
                outcome.last_frame, outcome.elapsed, outcome.lines_read, outcome.stalls
            );
            Ok(outcome)
        }
        Err(e) => {
            error!("Capture failed in state {:?}: {}", supervisor.state(), e);
            Err(e.into())
        }
    }
}

/// Parse, summarize and publish every measurement file in the data directory
pub fn pipeline_stage(config: &Config) -> Result<PipelineReport> {
    let (metrics, blobs) = sink::build_sinks(&config.sinks);
    Pipeline::new(&config.pipeline, metrics, blobs).run()
}

/// Render a startup or run failure with remediation hints
pub fn handle_startup_error(error: &Error) -> String {
    match error {
        Error::MissingCredential { var } => {
            format!(
                "Credential Error: environment variable '{}' is not set\n\nTry:\n• Export {} and {} before starting\n• Check the deployment secret configuration",
                var,
                credentials::USER_ENV_VAR,
                credentials::SECRET_ENV_VAR
            )
        }
        Error::Capture(CaptureError::Timeout { elapsed, .. }) => {
            format!(
                "Capture Error: no frames beyond the target within {:?}\n\nTry:\n• Check that the camera is reachable\n• Increase capture.hard_timeout_secs",
                elapsed
            )
        }
        Error::Capture(CaptureError::SpawnFailed { program, source }) => {
            format!(
                "Capture Error: could not start '{}': {}\n\nTry:\n• Check camera.binary in the configuration\n• Ensure the binary is executable",
                program, source
            )
        }
        Error::Capture(err) => {
            format!(
                "Capture Error: {}\n\nTry:\n• Check the camera credentials\n• Run with --debug for the full capture output",
                err
            )
        }
        Error::ConfigLoadFailed { path, reason } => {
            format!(
                "Configuration Error: Failed to load config from '{}': {}\n\nTry:\n• Check configuration file syntax\n• Ensure file permissions are correct",
                path.display(),
                reason
            )
        }
        Error::ConfigParseFailed { format, reason } => {
            format!(
                "Configuration Error: Failed to parse {} config: {}\n\nTry:\n• Check configuration file syntax\n• Ensure file is valid {}",
                format, reason, format
            )
        }
        Error::ConfigValidationFailed { field, reason } => {
            format!(
                "Configuration Error: Validation failed for '{}': {}\n\nTry:\n• Check configuration value\n• Remove the field to use the default",
                field, reason
            )
        }
        Error::Io(err) => {
            format!(
                "I/O Error: {}\n\nTry:\n• Check file permissions\n• Ensure the data directory exists\n• Verify disk space",
                err
            )
        }
        _ => format!(
            "Unexpected Error: {}\n\nPlease report this issue with debug logs enabled",
            error
        ),
    }
}
