//! Exponential smoothing of gap results for display.

use std::collections::HashMap;

use contracts::{GapTier, ObjectId, RelativeGapResult};

/// Pair of objects a smoothed series belongs to (reference, other)
pub type PairKey = (ObjectId, ObjectId);

#[derive(Debug, Clone, Copy)]
struct SmoothedState {
    tier: GapTier,
    time_gap: f64,
    confidence: f64,
}

/// Per-pair exponential moving average over successive gap results
///
/// A tier switch restarts the series so estimates of different quality
/// are never blended.
#[derive(Debug, Clone)]
pub struct GapSmoother {
    alpha: f64,
    state: HashMap<PairKey, SmoothedState>,
}

impl GapSmoother {
    pub fn new(smoothing_factor: f64) -> Self {
        let alpha = if smoothing_factor.is_finite() {
            smoothing_factor.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            alpha,
            state: HashMap::new(),
        }
    }

    /// Effective smoothing factor
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Blend `result` into the series for `pair` and return the smoothed value
    pub fn smooth(&mut self, pair: PairKey, result: RelativeGapResult) -> RelativeGapResult {
        let alpha = self.alpha;
        let next = match self.state.get(&pair) {
            Some(previous) if previous.tier == result.tier => SmoothedState {
                tier: result.tier,
                time_gap: alpha * result.time_gap + (1.0 - alpha) * previous.time_gap,
                confidence: alpha * result.confidence + (1.0 - alpha) * previous.confidence,
            },
            _ => SmoothedState {
                tier: result.tier,
                time_gap: result.time_gap,
                confidence: result.confidence,
            },
        };
        self.state.insert(pair, next);

        RelativeGapResult {
            time_gap: next.time_gap,
            confidence: next.confidence,
            ..result
        }
    }

    /// Forget every series
    pub fn reset(&mut self) {
        self.state.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(time_gap: f64, tier: GapTier, confidence: f64) -> RelativeGapResult {
        RelativeGapResult {
            time_gap,
            tier,
            confidence,
            is_estimated: false,
            distance_gap: 0.1,
        }
    }

    #[test]
    fn test_first_value_passes_through() {
        let mut smoother = GapSmoother::new(0.3);
        let out = smoother.smooth((0, 1), result(10.0, GapTier::PositionRecords, 0.9));
        assert_eq!(out.time_gap, 10.0);
        assert_eq!(out.confidence, 0.9);
    }

    #[test]
    fn test_ema_blends_values() {
        let mut smoother = GapSmoother::new(0.5);
        smoother.smooth((0, 1), result(10.0, GapTier::PositionRecords, 1.0));
        let out = smoother.smooth((0, 1), result(20.0, GapTier::PositionRecords, 0.5));
        assert_eq!(out.time_gap, 15.0);
        assert_eq!(out.confidence, 0.75);
        assert_eq!(out.distance_gap, 0.1);
    }

    #[test]
    fn test_tier_change_restarts_series() {
        let mut smoother = GapSmoother::new(0.5);
        smoother.smooth((0, 1), result(10.0, GapTier::LapHistory, 0.7));
        let out = smoother.smooth((0, 1), result(20.0, GapTier::PositionRecords, 1.0));
        assert_eq!(out.time_gap, 20.0);
        assert_eq!(out.tier, GapTier::PositionRecords);
    }

    #[test]
    fn test_pairs_are_independent() {
        let mut smoother = GapSmoother::new(0.5);
        smoother.smooth((0, 1), result(10.0, GapTier::ClassEstimate, 0.3));
        let out = smoother.smooth((0, 2), result(-4.0, GapTier::ClassEstimate, 0.3));
        assert_eq!(out.time_gap, -4.0);
    }

    #[test]
    fn test_alpha_is_clamped() {
        assert_eq!(GapSmoother::new(1.7).alpha(), 1.0);
        assert_eq!(GapSmoother::new(-0.2).alpha(), 0.0);
        assert_eq!(GapSmoother::new(f64::NAN).alpha(), 1.0);
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut smoother = GapSmoother::new(0.5);
        smoother.smooth((0, 1), result(10.0, GapTier::ClassEstimate, 0.3));
        smoother.reset();
        let out = smoother.smooth((0, 1), result(30.0, GapTier::ClassEstimate, 0.3));
        assert_eq!(out.time_gap, 30.0);
    }
}
