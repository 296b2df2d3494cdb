//! Replay statistics.

use std::time::Duration;

use observability::GapMetricsAggregator;

/// Statistics from a replay run
#[derive(Debug, Clone, Default)]
pub struct ReplayStats {
    /// Frames fed to the session
    pub frames: u64,

    /// Report ticks (every N frames)
    pub reports: u64,

    /// Malformed lines skipped
    pub parse_errors: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Objects with a history at the end of the run
    pub objects_tracked: usize,

    /// Archived laps held at the end of the run
    pub laps_archived: usize,

    /// Gap metrics aggregator
    pub gap_metrics: GapMetricsAggregator,
}

impl ReplayStats {
    /// Frames processed per wall-clock second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of gap results that came from interpolation, as percentage
    pub fn interpolated_rate(&self) -> f64 {
        let total = self.gap_metrics.total_gaps;
        if total > 0 {
            (total - self.gap_metrics.estimated_gaps) as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Replay Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Frames: {}", self.frames);
        println!("   ├─ Reports: {}", self.reports);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   ├─ Malformed lines: {}", self.parse_errors);
        println!("   ├─ Objects tracked: {}", self.objects_tracked);
        println!("   └─ Laps archived: {}", self.laps_archived);

        let summary = self.gap_metrics.summary();

        println!("\n📈 Gap Engine Metrics");
        println!("   ├─ Gap results: {}", summary.total_gaps);
        println!(
            "   ├─ Interpolated: {} ({:.2}%)",
            summary.total_gaps - summary.estimated_gaps,
            self.interpolated_rate()
        );
        println!("   ├─ Session resets: {}", summary.session_resets);
        println!("   └─ |time gap| (s): {}", summary.abs_gap_seconds);

        if summary.total_gaps > 0 {
            println!("\n🎯 Tier Usage");
            for tier in &summary.tiers {
                println!(
                    "   ├─ {}: {} ({:.2}%), confidence {}",
                    tier.tier, tier.count, tier.share, tier.confidence
                );
            }
        }

        println!();
    }
}
