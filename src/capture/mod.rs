//! Capture Supervisor
//!
//! Runs the camera's capture binary, follows its progress output and stops
//! once a frame index beyond the target is reported. The whole attempt is
//! bounded by a hard wall-clock deadline.
//!
//! ```text
//! Idle -> Launching -> Polling -> FrameTargetReached
//!                             \-> TimedOut
//!                             \-> ProcessDied
//! ```

pub mod process;
pub mod progress;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::credentials::{Credentials, REDACTED};
use crate::error::CaptureError;

pub use process::{ProcessStatus, ProgressSource, ThermalRawProcess};
pub use progress::{parse_frame_number, CaptureProgressEvent};

/// Parameters of one capture run
#[derive(Debug, Clone)]
pub struct CaptureSession {
    pub target_ip: String,
    pub credentials: Credentials,
    pub working_directory: PathBuf,
    /// Always at least 1, see [`CaptureSession::new`]
    pub frame_target: u64,
    pub hard_timeout: Duration,
}

impl CaptureSession {
    /// Create a session
    ///
    /// Capture only ends on a frame index strictly above `frame_target`, so
    /// a target of 0 is raised to 1 here (with a warning) instead of being
    /// rejected. Configuration files are stricter: `validate_config` refuses
    /// a `frame_target` of 0.
    pub fn new(
        target_ip: impl Into<String>,
        credentials: Credentials,
        working_directory: PathBuf,
        frame_target: u64,
        hard_timeout: Duration,
    ) -> Self {
        Self {
            target_ip: target_ip.into(),
            credentials,
            working_directory,
            frame_target: clamp_frame_target(frame_target),
            hard_timeout,
        }
    }

    /// Arguments passed to the capture binary. Contains the secret.
    pub fn command_args(&self) -> Vec<String> {
        vec![
            "--url".to_string(),
            self.target_ip.clone(),
            "--user".to_string(),
            self.credentials.user().to_string(),
            "--password".to_string(),
            self.credentials.expose_secret().to_string(),
            "--dir".to_string(),
            self.working_directory.display().to_string(),
        ]
    }

    /// Command line suitable for logging, with the secret masked
    pub fn redacted_command(&self, program: &Path) -> String {
        let mut args = self.command_args();
        if let Some(secret) = args.get_mut(5) {
            *secret = REDACTED.to_string();
        }
        format!("{} {}", program.display(), args.join(" "))
    }
}

fn clamp_frame_target(frame_target: u64) -> u64 {
    if frame_target == 0 {
        warn!("Frame target 0 is not supported, using 1");
        return 1;
    }
    frame_target
}

/// Polling behaviour of the supervisor
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    /// How long one poll waits for a line
    pub poll_interval: Duration,
    /// Consecutive end-of-stream reads tolerated while the process is alive
    pub max_empty_reads: u32,
    /// Time between SIGTERM and SIGKILL when stopping the process
    pub terminate_grace: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_empty_reads: 3,
            terminate_grace: Duration::from_secs(2),
        }
    }
}

/// Supervisor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Launching,
    Polling,
    FrameTargetReached,
    TimedOut,
    ProcessDied,
}

/// Summary of a successful capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    /// The frame index that ended the capture
    pub last_frame: u64,
    /// Lines consumed from the process
    pub lines_read: usize,
    /// Polls that saw no output
    pub stalls: u32,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct PollProgress {
    last_frame: Option<u64>,
    lines_read: usize,
    stalls: u32,
}

/// Drives one capture process to the frame target or a failure
pub struct CaptureSupervisor {
    program: PathBuf,
    settings: CaptureSettings,
    state: CaptureState,
    /// Secret scrubbed from every logged output line
    credentials: Option<Credentials>,
}

impl CaptureSupervisor {
    pub fn new(program: impl Into<PathBuf>, settings: CaptureSettings) -> Self {
        Self {
            program: program.into(),
            settings,
            state: CaptureState::Idle,
            credentials: None,
        }
    }

    /// Redact these credentials from logged process output
    ///
    /// [`CaptureSupervisor::capture`] sets this from the session; callers of
    /// [`CaptureSupervisor::supervise`] with their own source set it here.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Launch the capture binary and supervise it
    ///
    /// The process is stopped before returning, on success and on failure.
    pub async fn capture(&mut self, session: &CaptureSession) -> Result<CaptureOutcome, CaptureError> {
        self.transition(CaptureState::Launching);
        self.credentials = Some(session.credentials.clone());
        info!(
            "Calling camera interface: {}",
            session.redacted_command(&self.program)
        );

        let mut process = match ThermalRawProcess::spawn(&self.program, session) {
            Ok(process) => process,
            Err(e) => {
                self.transition(CaptureState::ProcessDied);
                return Err(e);
            }
        };

        let result = self
            .supervise(&mut process, session.frame_target, session.hard_timeout)
            .await;

        if let Err(e) = process.terminate(self.settings.terminate_grace).await {
            warn!("Failed to stop capture process: {}", e);
        }

        result
    }

    /// Poll `source` until a frame beyond `frame_target` is reported
    ///
    /// Stalls and end-of-stream reads are retried; the whole loop is
    /// abandoned once `hard_timeout` elapses.
    pub async fn supervise<S>(
        &mut self,
        source: &mut S,
        frame_target: u64,
        hard_timeout: Duration,
    ) -> Result<CaptureOutcome, CaptureError>
    where
        S: ProgressSource + ?Sized,
    {
        let started = Instant::now();
        let mut progress = PollProgress::default();
        self.transition(CaptureState::Polling);

        let polled = tokio::time::timeout(
            hard_timeout,
            poll_until_target(
                &self.settings,
                self.credentials.as_ref(),
                source,
                frame_target,
                &mut progress,
            ),
        )
        .await;

        match polled {
            Ok(Ok(last_frame)) => {
                self.transition(CaptureState::FrameTargetReached);
                Ok(CaptureOutcome {
                    last_frame,
                    lines_read: progress.lines_read,
                    stalls: progress.stalls,
                    elapsed: started.elapsed(),
                })
            }
            Ok(Err(e)) => {
                self.transition(CaptureState::ProcessDied);
                Err(e)
            }
            Err(_) => {
                self.transition(CaptureState::TimedOut);
                Err(CaptureError::Timeout {
                    elapsed: started.elapsed(),
                    last_frame: progress.last_frame,
                })
            }
        }
    }

    fn transition(&mut self, next: CaptureState) {
        debug!("Capture state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Returns the frame index that exceeded `frame_target`
async fn poll_until_target<S>(
    settings: &CaptureSettings,
    credentials: Option<&Credentials>,
    source: &mut S,
    frame_target: u64,
    progress: &mut PollProgress,
) -> Result<u64, CaptureError>
where
    S: ProgressSource + ?Sized,
{
    let mut empty_reads = 0u32;

    loop {
        let line = match tokio::time::timeout(settings.poll_interval, source.next_line()).await {
            Err(_) => {
                progress.stalls += 1;
                warn!("Timeout waiting for camera interface output");
                continue;
            }
            Ok(Err(e)) => return Err(CaptureError::ReadFailed(e)),
            Ok(Ok(None)) => {
                empty_reads += 1;
                warn!(
                    "No data from camera interface output ({}/{})",
                    empty_reads, settings.max_empty_reads
                );

                if let ProcessStatus::Exited(exit_code) =
                    source.status().map_err(CaptureError::ReadFailed)?
                {
                    return Err(CaptureError::ProcessExited {
                        exit_code,
                        last_frame: progress.last_frame,
                    });
                }
                if empty_reads >= settings.max_empty_reads {
                    return Err(CaptureError::ProcessExited {
                        exit_code: None,
                        last_frame: progress.last_frame,
                    });
                }

                // A closed stream returns immediately; pace the retries
                tokio::time::sleep(settings.poll_interval).await;
                continue;
            }
            Ok(Ok(Some(line))) => line,
        };

        empty_reads = 0;
        progress.lines_read += 1;

        let event = CaptureProgressEvent::from_line(&line);
        if event.raw_line.is_empty() {
            debug!("Blank line from camera interface");
            continue;
        }
        info!("{}", loggable(&event.raw_line, credentials));

        let Some(frame) = event.parsed_frame_number else {
            continue;
        };
        progress.last_frame = Some(frame);
        if event.exceeds(frame_target) {
            info!("Max frame count reached, closing camera capture");
            return Ok(frame);
        }
    }
}

/// Process output as it may appear in logs
fn loggable(line: &str, credentials: Option<&Credentials>) -> String {
    match credentials {
        Some(credentials) => credentials.redact(line),
        None => line.to_string(),
    }
}
