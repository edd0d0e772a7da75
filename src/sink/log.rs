//! Tracing-backed sink

use std::path::Path;

use super::{BlobSink, MetricSink, Sink};
use crate::error::Result;

/// Writes every metric and upload to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for LogSink {
    fn name(&self) -> &str {
        "log"
    }
}

impl MetricSink for LogSink {
    fn publish(&mut self, name: &str, value: f64, timestamp_ns: i64) -> Result<()> {
        info!(metric = name, value, timestamp = timestamp_ns, "publish");
        Ok(())
    }
}

impl BlobSink for LogSink {
    fn upload(&mut self, path: &Path, timestamp_ns: i64) -> Result<()> {
        info!(file = %path.display(), timestamp = timestamp_ns, "upload");
        Ok(())
    }
}
