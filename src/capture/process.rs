//! Capture Process Spawning
//!
//! Launches the external capture binary with only its stdout piped and exposes
//! that stream line by line through [`ProgressSource`].

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};

use super::CaptureSession;
use crate::error::CaptureError;

/// Liveness of the producer behind a [`ProgressSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Still running
    Running,
    /// Exited, with its exit code when one is available
    Exited(Option<i32>),
}

/// Line-oriented progress output of a capture process
///
/// The supervisor drives this through a per-poll timeout, so `next_line`
/// must be cancel safe: a cancelled call must not lose buffered output.
#[async_trait]
pub trait ProgressSource: Send {
    /// Next line of output; `Ok(None)` means end of stream
    async fn next_line(&mut self) -> std::io::Result<Option<String>>;

    /// Whether the producing process has exited
    fn status(&mut self) -> std::io::Result<ProcessStatus>;

    /// Stop the producing process, escalating after `grace`
    async fn terminate(&mut self, grace: Duration) -> Result<(), CaptureError>;
}

/// A running instance of the camera's capture binary
pub struct ThermalRawProcess {
    child: Child,
    reader: BufReader<ChildStdout>,
    pending: Vec<u8>,
}

impl ThermalRawProcess {
    /// Spawn `program` with the session's URL, credentials and output directory
    pub fn spawn(program: &Path, session: &CaptureSession) -> Result<Self, CaptureError> {
        let program_name = program.display().to_string();

        let mut child = Command::new(program)
            .args(session.command_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CaptureError::SpawnFailed {
                program: program_name.clone(),
                source: e,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| CaptureError::SpawnFailed {
            program: program_name,
            source: std::io::Error::other("stdout was not captured"),
        })?;

        debug!("Capture process started (pid {:?})", child.id());

        Ok(Self {
            child,
            reader: BufReader::new(stdout),
            pending: Vec::new(),
        })
    }

    /// OS process id, if the process has not been reaped yet
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    #[cfg(unix)]
    fn send_sigterm(&self) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = self.pid() {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                debug!("SIGTERM to capture process {} failed: {}", pid, e);
            }
        }
    }
}

#[async_trait]
impl ProgressSource for ThermalRawProcess {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        // read_until keeps partial data in `pending` when cancelled
        let n = self.reader.read_until(b'\n', &mut self.pending).await?;
        if n == 0 && self.pending.is_empty() {
            return Ok(None);
        }

        // Device output is not guaranteed to be valid UTF-8
        let line = String::from_utf8_lossy(&self.pending)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        self.pending.clear();
        Ok(Some(line))
    }

    fn status(&mut self) -> std::io::Result<ProcessStatus> {
        Ok(match self.child.try_wait()? {
            Some(status) => ProcessStatus::Exited(status.code()),
            None => ProcessStatus::Running,
        })
    }

    async fn terminate(&mut self, grace: Duration) -> Result<(), CaptureError> {
        if let Ok(Some(status)) = self.child.try_wait() {
            debug!("Capture process already exited: {}", status);
            return Ok(());
        }

        #[cfg(unix)]
        self.send_sigterm();

        #[cfg(not(unix))]
        let grace = Duration::ZERO;

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Capture process exited after SIGTERM: {}", status);
                Ok(())
            }
            Ok(Err(e)) => Err(CaptureError::TerminateFailed {
                reason: e.to_string(),
            }),
            Err(_) => {
                warn!(
                    "Capture process still running {:?} after SIGTERM, killing",
                    grace
                );
                self.child
                    .kill()
                    .await
                    .map_err(|e| CaptureError::TerminateFailed {
                        reason: e.to_string(),
                    })
            }
        }
    }
}
