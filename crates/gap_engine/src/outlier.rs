//! Outlier lap filter.
//!
//! A completed lap is valid when its time lies within
//! `max(2 * std_dev, 0.1 * median)` of the median of the recent valid laps.
//! The deviation is the population standard deviation.

use crate::interpolation::median;

/// Standard deviations allowed around the median
const STD_DEV_FACTOR: f64 = 2.0;
/// Fraction of the median always tolerated (small datasets)
const MEDIAN_FRACTION: f64 = 0.1;

/// Summary statistics of a set of lap times
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapTimeStats {
    pub median: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl LapTimeStats {
    /// Statistics of `lap_times`, `None` when empty
    pub fn from_lap_times(lap_times: &[f64]) -> Option<Self> {
        let mut sorted = lap_times.to_vec();
        let median = median(&mut sorted)?;

        let count = lap_times.len() as f64;
        let mean = lap_times.iter().sum::<f64>() / count;
        let variance = lap_times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / count;

        Some(Self {
            median,
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Maximum allowed distance from the median
    #[inline]
    pub fn threshold(&self) -> f64 {
        (self.std_dev * STD_DEV_FACTOR).max(self.median * MEDIAN_FRACTION)
    }
}

/// Whether `lap_time` is consistent with `recent_valid_lap_times`
pub fn is_valid_lap(lap_time: f64, recent_valid_lap_times: &[f64]) -> bool {
    let Some(stats) = LapTimeStats::from_lap_times(recent_valid_lap_times) else {
        return true;
    };
    if lap_time <= 0.0 {
        return false;
    }
    (lap_time - stats.median).abs() <= stats.threshold()
}
