//! Metric and blob sinks
//!
//! The pipeline hands its results to two collaborators: a metric sink that
//! takes named scalar values and a blob sink that takes whole files. Both are
//! opened and closed around each publish through [`SinkGuard`].

pub mod jsonl;
pub mod log;
pub mod memory;
pub mod outbox;

use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::config::SinkConfig;
use crate::error::Result;

pub use self::jsonl::JsonLinesMetricSink;
pub use self::log::LogSink;
pub use self::memory::{MemorySink, SinkEvent};
pub use self::outbox::OutboxBlobSink;

/// Lifecycle shared by all sinks
pub trait Sink: Send {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Accepts named scalar metrics
pub trait MetricSink: Sink {
    fn publish(&mut self, name: &str, value: f64, timestamp_ns: i64) -> Result<()>;
}

/// Accepts files for upload
pub trait BlobSink: Sink {
    fn upload(&mut self, path: &Path, timestamp_ns: i64) -> Result<()>;
}

/// An opened sink that is closed when the guard goes away
///
/// Prefer [`SinkGuard::close`] to observe close errors; a dropped guard
/// closes the sink and only logs them.
pub struct SinkGuard<'a, S: Sink + ?Sized> {
    sink: Option<&'a mut S>,
}

impl<'a, S: Sink + ?Sized> SinkGuard<'a, S> {
    pub fn open(sink: &'a mut S) -> Result<Self> {
        sink.open()?;
        Ok(Self { sink: Some(sink) })
    }

    pub fn close(mut self) -> Result<()> {
        match self.sink.take() {
            Some(sink) => sink.close(),
            None => Ok(()),
        }
    }
}

impl<S: Sink + ?Sized> Deref for SinkGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        // Only `close` takes the sink, and it consumes the guard
        self.sink.as_deref().expect("sink guard used after close")
    }
}

impl<S: Sink + ?Sized> DerefMut for SinkGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.sink.as_deref_mut().expect("sink guard used after close")
    }
}

impl<S: Sink + ?Sized> Drop for SinkGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            if let Err(e) = sink.close() {
                warn!("Failed to close sink '{}': {}", sink.name(), e);
            }
        }
    }
}

/// Forwards every call to a list of sinks, in order
pub struct Fanout<S: ?Sized> {
    sinks: Vec<Box<S>>,
}

impl<S: Sink + ?Sized> Fanout<S> {
    pub fn new(sinks: Vec<Box<S>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<S: Sink + ?Sized> Sink for Fanout<S> {
    fn name(&self) -> &str {
        "fanout"
    }

    /// Open every sink; on failure the ones already opened are closed again
    fn open(&mut self) -> Result<()> {
        for index in 0..self.sinks.len() {
            if let Err(e) = self.sinks[index].open() {
                for opened in &mut self.sinks[..index] {
                    if let Err(close_err) = opened.close() {
                        warn!("Failed to close sink '{}': {}", opened.name(), close_err);
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // Close everything, report the first failure
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.close() {
                warn!("Failed to close sink '{}': {}", sink.name(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl MetricSink for Fanout<dyn MetricSink> {
    fn publish(&mut self, name: &str, value: f64, timestamp_ns: i64) -> Result<()> {
        for sink in &mut self.sinks {
            sink.publish(name, value, timestamp_ns)?;
        }
        Ok(())
    }
}

impl BlobSink for Fanout<dyn BlobSink> {
    fn upload(&mut self, path: &Path, timestamp_ns: i64) -> Result<()> {
        for sink in &mut self.sinks {
            sink.upload(path, timestamp_ns)?;
        }
        Ok(())
    }
}

/// Build the metric and blob sinks described by the configuration
pub fn build_sinks(config: &SinkConfig) -> (Box<dyn MetricSink>, Box<dyn BlobSink>) {
    let mut metrics: Vec<Box<dyn MetricSink>> = Vec::new();
    let mut blobs: Vec<Box<dyn BlobSink>> = Vec::new();

    if config.log_metrics {
        metrics.push(Box::new(LogSink::new()));
        blobs.push(Box::new(LogSink::new()));
    }
    if let Some(path) = &config.metrics_file {
        metrics.push(Box::new(JsonLinesMetricSink::new(path.clone())));
    }
    if let Some(dir) = &config.outbox_dir {
        blobs.push(Box::new(OutboxBlobSink::new(dir.clone())));
    }

    debug!(
        "Configured {} metric sinks and {} blob sinks",
        metrics.len(),
        blobs.len()
    );
    (
        Box::new(Fanout::<dyn MetricSink>::new(metrics)),
        Box::new(Fanout::<dyn BlobSink>::new(blobs)),
    )
}
