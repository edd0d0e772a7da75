//! Summary statistics over a measurement grid

use serde::{Deserialize, Serialize};

use super::grid::MeasurementGrid;

pub const METRIC_MEAN: &str = "thermal.mean.c";
pub const METRIC_STD_DEV: &str = "thermal.stddev.c";
pub const METRIC_MAX: &str = "thermal.max.c";
pub const METRIC_MIN: &str = "thermal.min.c";

/// Mean, population standard deviation, minimum and maximum of every cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStatistics {
    /// `(metric name, value)` pairs in publication order
    pub fn metrics(&self) -> [(&'static str, f64); 4] {
        [
            (METRIC_MEAN, self.mean),
            (METRIC_STD_DEV, self.std_dev),
            (METRIC_MAX, self.max),
            (METRIC_MIN, self.min),
        ]
    }
}

/// Statistics plus the nanosecond epoch timestamp they were computed at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StampedSummary {
    pub stats: SummaryStatistics,
    pub timestamp_ns: i64,
}

/// Summarize every cell of `grid`
///
/// Two passes in `f64`: mean first, then the population variance (divisor N).
/// Both sums use the blocked pairwise scheme numpy's `add.reduce` uses, so
/// results track `np.mean`/`np.std` on the same data. Deterministic, so
/// repeated calls on the same grid are bit-identical.
///
/// Where this differs from plain numpy: a constant grid reports its
/// value as the mean exactly, and otherwise the mean is clamped to
/// `[min, max]` in case rounding pushed it a hair outside.
pub fn summarize(grid: &MeasurementGrid) -> SummaryStatistics {
    let cells = grid.cells();
    // Grids are never empty; this only keeps the division well-defined
    let n = grid.len().max(1) as f64;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &value in cells {
        min = min.min(value);
        max = max.max(value);
    }

    if min == max {
        return SummaryStatistics {
            mean: min,
            std_dev: 0.0,
            min,
            max,
        };
    }

    let mean = (reduce_sum(cells) / n).clamp(min, max);
    let squared: Vec<f64> = cells
        .iter()
        .map(|&value| (value - mean) * (value - mean))
        .collect();

    SummaryStatistics {
        mean,
        std_dev: (reduce_sum(&squared) / n).sqrt(),
        min,
        max,
    }
}

/// Sum as a reduction: the first value seeds the total, the rest are
/// added pairwise
fn reduce_sum(values: &[f64]) -> f64 {
    match values.split_first() {
        Some((&first, rest)) => first + pairwise_sum(rest),
        None => 0.0,
    }
}

const PAIRWISE_BLOCK: usize = 128;

/// Blocked pairwise summation
///
/// Short runs are summed in order, blocks of up to 128 use eight interleaved
/// accumulators, longer runs split in half at a multiple of eight.
fn pairwise_sum(values: &[f64]) -> f64 {
    let n = values.len();

    if n < 8 {
        return values.iter().fold(0.0, |acc, &v| acc + v);
    }

    if n <= PAIRWISE_BLOCK {
        let mut acc = [0.0f64; 8];
        acc.copy_from_slice(&values[..8]);

        let unrolled = n - n % 8;
        for chunk in values[8..unrolled].chunks_exact(8) {
            for (slot, &v) in acc.iter_mut().zip(chunk) {
                *slot += v;
            }
        }

        let mut total =
            ((acc[0] + acc[1]) + (acc[2] + acc[3])) + ((acc[4] + acc[5]) + (acc[6] + acc[7]));
        for &v in &values[unrolled..] {
            total += v;
        }
        return total;
    }

    let mut half = n / 2;
    half -= half % 8;
    pairwise_sum(&values[..half]) + pairwise_sum(&values[half..])
}
