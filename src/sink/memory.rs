//! In-memory sink that records every call

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{BlobSink, MetricSink, Sink};
use crate::error::Result;

/// A call observed by [`MemorySink`]
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Opened,
    Closed,
    Metric {
        name: String,
        value: f64,
        timestamp_ns: i64,
    },
    Upload {
        path: PathBuf,
        timestamp_ns: i64,
    },
}

/// Records calls in order; clones share the same record
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.lock().clone()
    }

    /// `(name, value, timestamp)` of every published metric
    pub fn metrics(&self) -> Vec<(String, f64, i64)> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Metric {
                    name,
                    value,
                    timestamp_ns,
                } => Some((name.clone(), *value, *timestamp_ns)),
                _ => None,
            })
            .collect()
    }

    /// `(path, timestamp)` of every upload
    pub fn uploads(&self) -> Vec<(PathBuf, i64)> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Upload { path, timestamp_ns } => Some((path.clone(), *timestamp_ns)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: SinkEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SinkEvent>> {
        // A panic while holding the lock leaves the Vec intact
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&mut self) -> Result<()> {
        self.record(SinkEvent::Opened);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.record(SinkEvent::Closed);
        Ok(())
    }
}

impl MetricSink for MemorySink {
    fn publish(&mut self, name: &str, value: f64, timestamp_ns: i64) -> Result<()> {
        self.record(SinkEvent::Metric {
            name: name.to_string(),
            value,
            timestamp_ns,
        });
        Ok(())
    }
}

impl BlobSink for MemorySink {
    fn upload(&mut self, path: &Path, timestamp_ns: i64) -> Result<()> {
        self.record(SinkEvent::Upload {
            path: path.to_path_buf(),
            timestamp_ns,
        });
        Ok(())
    }
}
