//! Capture timestamps
//!
//! Wall-clock time is read once and advanced with a monotonic clock, so
//! timestamps within a run never go backwards even if the system clock is
//! stepped.

use std::time::Instant;

use chrono::{DateTime, Utc};

/// Source of nanosecond epoch timestamps
#[derive(Debug, Clone)]
pub struct CaptureClock {
    anchor_ns: i64,
    anchor: Instant,
}

impl CaptureClock {
    pub fn new() -> Self {
        Self::anchored_at(Utc::now())
    }

    /// Clock whose first reading is `wall` (plus elapsed monotonic time)
    pub fn anchored_at(wall: DateTime<Utc>) -> Self {
        Self {
            // Only fails past the year 2262
            anchor_ns: wall.timestamp_nanos_opt().unwrap_or(i64::MAX),
            anchor: Instant::now(),
        }
    }

    /// Nanoseconds since the Unix epoch
    pub fn now_ns(&self) -> i64 {
        let elapsed = i64::try_from(self.anchor.elapsed().as_nanos()).unwrap_or(i64::MAX);
        self.anchor_ns.saturating_add(elapsed)
    }
}

impl Default for CaptureClock {
    fn default() -> Self {
        Self::new()
    }
}
