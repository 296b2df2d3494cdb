//! Gap engine metrics: Prometheus recording helpers and an in-memory
//! aggregator for end-of-run summaries.

use std::collections::HashMap;

use contracts::{GapTier, ObjectId, RelativeGapResult};
use metrics::{counter, gauge, histogram};

const TIERS: [GapTier; 3] = [
    GapTier::PositionRecords,
    GapTier::LapHistory,
    GapTier::ClassEstimate,
];

/// Record one reported gap
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_gap_metrics;
///
/// let gap = session.relative_gap(&params, est_a, est_b, &flags);
/// record_gap_metrics(params.other_id, &gap);
/// ```
pub fn record_gap_metrics(other_id: ObjectId, result: &RelativeGapResult) {
    gauge!("relgap_time_gap_seconds", "object_id" => other_id.to_string()).set(result.time_gap);
    histogram!("relgap_time_gap_abs_seconds").record(result.time_gap.abs());
    if result.is_estimated {
        counter!("relgap_gap_estimated_total").increment(1);
    }
}

/// Record one processed telemetry frame
pub fn record_frame_processed(tracked_objects: usize) {
    counter!("relgap_frames_processed_total").increment(1);
    gauge!("relgap_tracked_objects").set(tracked_objects as f64);
}

/// Record archived lap history size across all objects
pub fn record_lap_history_depth(total_laps: usize) {
    gauge!("relgap_lap_records").set(total_laps as f64);
}

/// Gap metrics aggregator
///
/// Aggregates in memory so a run can print a summary at the end.
#[derive(Debug, Clone, Default)]
pub struct GapMetricsAggregator {
    /// Frames fed to the session
    pub total_frames: u64,

    /// Gap results observed
    pub total_gaps: u64,

    /// Results flagged as estimated
    pub estimated_gaps: u64,

    /// Session resets seen
    pub session_resets: u64,

    /// Results per tier
    pub tier_counts: HashMap<GapTier, u64>,

    /// Confidence per tier
    pub confidence_stats: HashMap<GapTier, RunningStats>,

    /// Absolute time gap (seconds)
    pub abs_gap_stats: RunningStats,
}

impl GapMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&mut self) {
        self.total_frames += 1;
    }

    pub fn record_session_reset(&mut self) {
        self.session_resets += 1;
    }

    /// Update aggregate statistics with one gap result
    pub fn update(&mut self, result: &RelativeGapResult) {
        self.total_gaps += 1;
        if result.is_estimated {
            self.estimated_gaps += 1;
        }
        *self.tier_counts.entry(result.tier).or_insert(0) += 1;
        self.confidence_stats
            .entry(result.tier)
            .or_default()
            .push(result.confidence);
        self.abs_gap_stats.push(result.time_gap.abs());
    }

    /// Generate summary report
    pub fn summary(&self) -> MetricsSummary {
        let tiers = TIERS
            .iter()
            .map(|tier| TierSummary {
                tier: *tier,
                count: self.tier_counts.get(tier).copied().unwrap_or(0),
                share: if self.total_gaps > 0 {
                    self.tier_counts.get(tier).copied().unwrap_or(0) as f64
                        / self.total_gaps as f64
                        * 100.0
                } else {
                    0.0
                },
                confidence: self
                    .confidence_stats
                    .get(tier)
                    .map(StatsSummary::from)
                    .unwrap_or_default(),
            })
            .collect();

        MetricsSummary {
            total_frames: self.total_frames,
            total_gaps: self.total_gaps,
            estimated_gaps: self.estimated_gaps,
            session_resets: self.session_resets,
            tiers,
            abs_gap_seconds: StatsSummary::from(&self.abs_gap_stats),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Per-tier part of a summary
#[derive(Debug, Clone)]
pub struct TierSummary {
    pub tier: GapTier,
    pub count: u64,
    /// Percentage of all results
    pub share: f64,
    pub confidence: StatsSummary,
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub total_gaps: u64,
    pub estimated_gaps: u64,
    pub session_resets: u64,
    pub tiers: Vec<TierSummary>,
    pub abs_gap_seconds: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Relative Gap Summary ===")?;
        writeln!(f, "Total frames: {}", self.total_frames)?;
        writeln!(f, "Gap results: {}", self.total_gaps)?;
        writeln!(f, "Estimated results: {}", self.estimated_gaps)?;
        writeln!(f, "Session resets: {}", self.session_resets)?;
        for tier in &self.tiers {
            writeln!(
                f,
                "  {:<17} {} ({:.2}%) confidence: {}",
                tier.tier.as_str(),
                tier.count,
                tier.share,
                tier.confidence
            )?;
        }
        writeln!(f, "|time gap| (s): {}", self.abs_gap_seconds)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(tier: GapTier, time_gap: f64, confidence: f64) -> RelativeGapResult {
        RelativeGapResult {
            time_gap,
            tier,
            confidence,
            is_estimated: tier != GapTier::PositionRecords,
            distance_gap: 0.0,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = GapMetricsAggregator::new();
        aggregator.record_frame();
        aggregator.update(&result(GapTier::PositionRecords, 4.0, 1.0));
        aggregator.update(&result(GapTier::PositionRecords, -2.0, 0.8));
        aggregator.update(&result(GapTier::ClassEstimate, 6.0, 0.3));

        assert_eq!(aggregator.total_frames, 1);
        assert_eq!(aggregator.total_gaps, 3);
        assert_eq!(aggregator.estimated_gaps, 1);
        assert_eq!(
            aggregator.tier_counts.get(&GapTier::PositionRecords),
            Some(&2)
        );
        assert!((aggregator.abs_gap_stats.mean() - 4.0).abs() < 1e-10);

        let summary = aggregator.summary();
        assert_eq!(summary.tiers.len(), 3);
        assert_eq!(summary.tiers[1].count, 0);
        assert!((summary.tiers[0].confidence.mean - 0.9).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = GapMetricsAggregator::new();
        for _ in 0..3 {
            aggregator.update(&result(GapTier::LapHistory, 1.0, 0.6));
        }
        aggregator.update(&result(GapTier::ClassEstimate, 1.0, 0.3));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Gap results: 4"), "got: {output}");
        assert!(output.contains("75.00%"), "got: {output}");
        assert!(output.contains("lap-history"), "got: {output}");
    }

    #[test]
    fn test_empty_summary() {
        let output = GapMetricsAggregator::new().summary().to_string();
        assert!(output.contains("N/A"), "got: {output}");
    }
}
