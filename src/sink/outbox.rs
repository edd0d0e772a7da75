//! Directory-backed blob sink

use std::fs;
use std::path::{Path, PathBuf};

use super::{BlobSink, Sink};
use crate::error::{Error, Result};

/// Copies uploaded files into an outbox directory as `<timestamp>-<name>`
pub struct OutboxBlobSink {
    dir: PathBuf,
}

impl OutboxBlobSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn failure(&self, reason: impl ToString) -> Error {
        Error::SinkFailed {
            sink: format!("outbox:{}", self.dir.display()),
            reason: reason.to_string(),
        }
    }
}

impl Sink for OutboxBlobSink {
    fn name(&self) -> &str {
        "outbox"
    }

    fn open(&mut self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| self.failure(e))
    }
}

impl BlobSink for OutboxBlobSink {
    fn upload(&mut self, path: &Path, timestamp_ns: i64) -> Result<()> {
        let file_name = path
            .file_name()
            .ok_or_else(|| self.failure(format!("'{}' has no file name", path.display())))?;
        let target = self
            .dir
            .join(format!("{}-{}", timestamp_ns, file_name.to_string_lossy()));

        fs::copy(path, &target).map_err(|e| self.failure(e))?;
        debug!("Copied {} to {}", path.display(), target.display());
        Ok(())
    }
}
