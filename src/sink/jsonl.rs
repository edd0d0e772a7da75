//! JSON-lines metric sink

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{MetricSink, Sink};
use crate::error::{Error, Result};

/// One line of the metrics file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub name: String,
    pub value: f64,
    pub timestamp: i64,
}

/// Appends `{"name","value","timestamp"}` records to a file
///
/// The file is opened in append mode by `open` and flushed by `close`.
pub struct JsonLinesMetricSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonLinesMetricSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path, writer: None }
    }

    fn failure(&self, reason: impl ToString) -> Error {
        Error::SinkFailed {
            sink: format!("jsonl:{}", self.path.display()),
            reason: reason.to_string(),
        }
    }
}

impl Sink for JsonLinesMetricSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn open(&mut self) -> Result<()> {
        if self.writer.is_some() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.failure(e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.failure(e))?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush().map_err(|e| self.failure(e)),
            None => Ok(()),
        }
    }
}

impl MetricSink for JsonLinesMetricSink {
    fn publish(&mut self, name: &str, value: f64, timestamp_ns: i64) -> Result<()> {
        let record = MetricRecord {
            name: name.to_string(),
            value,
            timestamp: timestamp_ns,
        };

        let Some(writer) = self.writer.as_mut() else {
            return Err(self.failure("sink is not open"));
        };
        let written = serde_json::to_writer(&mut *writer, &record)
            .map_err(Error::from)
            .and_then(|_| writer.write_all(b"\n").map_err(Error::from));
        written.map_err(|e| self.failure(e))
    }
}
