//! Interpolation engine for the time at an arbitrary track position.
//!
//! All functions are pure. Sample slices must be sorted ascending by
//! position, which is what the lap archiver guarantees for every
//! [`LapRecord`].

use contracts::{InterpolationMethod, LapRecord, PositionSample};

/// Minimum sample count for a Catmull-Rom lookup
const CUBIC_MIN_SAMPLES: usize = 4;

/// Result of a single time lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationResult {
    /// Interpolated time (seconds since lap start, or a difference of two)
    pub time: f64,
    /// False when the target was outside the sampled range
    pub is_interpolated: bool,
    /// Trust weight (0.0 to 1.0)
    pub confidence: f64,
}

impl InterpolationResult {
    const EMPTY: Self = Self {
        time: 0.0,
        is_interpolated: false,
        confidence: 0.0,
    };
}

/// Indices of the two samples surrounding a target position
///
/// `lower == upper` marks an exact position match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub lower: usize,
    pub upper: usize,
}

/// Find the samples surrounding `target` with a binary search
///
/// Targets at or before the first sample bracket `[0, 1]`; targets at or
/// after the last sample bracket the last two indices. A non-finite target
/// has no bracket.
pub fn find_bracket(samples: &[PositionSample], target: f64) -> Option<Bracket> {
    let n = samples.len();
    if !target.is_finite() {
        return None;
    }
    match n {
        0 => return None,
        1 => return Some(Bracket { lower: 0, upper: 0 }),
        _ => {}
    }

    if target <= samples[0].position {
        return Some(Bracket { lower: 0, upper: 1 });
    }
    if target >= samples[n - 1].position {
        return Some(Bracket {
            lower: n - 2,
            upper: n - 1,
        });
    }

    // First index whose position is >= target; 1..n for sorted samples
    let idx = samples.partition_point(|s| s.position < target);
    if idx == 0 || idx >= n {
        return None;
    }
    if samples[idx].position == target {
        return Some(Bracket {
            lower: idx,
            upper: idx,
        });
    }
    Some(Bracket {
        lower: idx - 1,
        upper: idx,
    })
}

/// Linear interpolation between `(x0, y0)` and `(x1, y1)`
#[inline]
pub fn linear_interpolate(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if x1 == x0 {
        return y0;
    }
    let t = (x - x0) / (x1 - x0);
    y0 + t * (y1 - y0)
}

/// Catmull-Rom interpolation of `time` between `samples[lower]` and its successor
///
/// Neighbour indices are clamped to the slice bounds. Falls back to linear
/// interpolation with fewer than four samples; an empty slice yields `0.0`.
pub fn catmull_rom(samples: &[PositionSample], lower: usize, target: f64) -> f64 {
    let Some(last) = samples.len().checked_sub(1) else {
        return 0.0;
    };
    let lower = lower.min(last);
    if samples.len() < CUBIC_MIN_SAMPLES {
        let upper = (lower + 1).min(last);
        return linear_interpolate(
            samples[lower].position,
            samples[lower].time,
            samples[upper].position,
            samples[upper].time,
            target,
        );
    }

    let p0 = &samples[lower.saturating_sub(1)];
    let p1 = &samples[lower];
    let p2 = &samples[(lower + 1).min(last)];
    let p3 = &samples[(lower + 2).min(last)];

    let span = p2.position - p1.position;
    if span == 0.0 {
        return p1.time;
    }
    let t = (target - p1.position) / span;
    let t2 = t * t;
    let t3 = t2 * t;

    let a = -0.5 * p0.time + 1.5 * p1.time - 1.5 * p2.time + 0.5 * p3.time;
    let b = p0.time - 2.5 * p1.time + 2.0 * p2.time - 0.5 * p3.time;
    let c = -0.5 * p0.time + 0.5 * p2.time;
    let d = p1.time;

    a * t3 + b * t2 + c * t + d
}

/// Confidence for a lookup, from sample density and extrapolation
fn lookup_confidence(sample_gap: f64, is_extrapolating: bool) -> f64 {
    if is_extrapolating {
        0.5
    } else if sample_gap > 0.05 {
        (1.0 - sample_gap * 2.0).max(0.6)
    } else if sample_gap >= 0.01 {
        0.9
    } else {
        1.0
    }
}

/// Interpolate the lap time at `target` from sorted samples
pub fn interpolate_time(
    samples: &[PositionSample],
    target: f64,
    method: InterpolationMethod,
) -> InterpolationResult {
    match samples {
        [] => return InterpolationResult::EMPTY,
        [only] => {
            return InterpolationResult {
                time: only.time,
                is_interpolated: false,
                confidence: 0.3,
            }
        }
        _ => {}
    }

    let Some(Bracket { lower, upper }) = find_bracket(samples, target) else {
        return InterpolationResult::EMPTY;
    };
    let lower_sample = &samples[lower];
    let upper_sample = &samples[upper];

    let first = samples[0].position;
    let last = samples[samples.len() - 1].position;
    let is_extrapolating = target < first || target > last;

    let time = match method {
        InterpolationMethod::Cubic if samples.len() >= CUBIC_MIN_SAMPLES && !is_extrapolating => {
            catmull_rom(samples, lower, target)
        }
        _ => linear_interpolate(
            lower_sample.position,
            lower_sample.time,
            upper_sample.position,
            upper_sample.time,
            target,
        ),
    };

    InterpolationResult {
        time,
        is_interpolated: !is_extrapolating,
        confidence: lookup_confidence(
            upper_sample.position - lower_sample.position,
            is_extrapolating,
        ),
    }
}

/// Time difference between two positions on the same lap curve
///
/// Positive when `position_b` is reached later than `position_a`.
pub fn time_gap_from_samples(
    samples: &[PositionSample],
    position_a: f64,
    position_b: f64,
    method: InterpolationMethod,
) -> InterpolationResult {
    let a = interpolate_time(samples, position_a, method);
    let b = interpolate_time(samples, position_b, method);

    InterpolationResult {
        time: b.time - a.time,
        is_interpolated: a.is_interpolated && b.is_interpolated,
        confidence: a.confidence.min(b.confidence),
    }
}

/// Median lap time of the valid records, `None` if there are none
pub fn median_lap_time<'a, I>(records: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a LapRecord>,
{
    let mut times: Vec<f64> = records
        .into_iter()
        .filter(|lap| lap.is_valid)
        .map(|lap| lap.lap_time)
        .collect();
    median(&mut times)
}

/// Median of `values` (sorted in place); even counts average the middle pair
pub(crate) fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Wrap a position into `[0, 1)`
pub fn normalize_position(position: f64) -> f64 {
    if !position.is_finite() {
        return 0.0;
    }
    let mut normalized = position % 1.0;
    if normalized < 0.0 {
        normalized += 1.0;
    }
    // -1e-17 + 1.0 rounds up to exactly 1.0
    if normalized >= 1.0 {
        normalized = 0.0;
    }
    normalized
}

/// Signed shortest circular difference (positive if `position_b` is ahead)
#[inline]
pub fn position_difference(position_a: f64, position_b: f64) -> f64 {
    let diff = position_b - position_a;
    if diff > 0.5 {
        diff - 1.0
    } else if diff < -0.5 {
        diff + 1.0
    } else {
        diff
    }
}
