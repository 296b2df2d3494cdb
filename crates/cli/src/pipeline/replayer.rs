//! Replay pipeline - feeds a telemetry recording through a gap session.
//!
//! Every frame updates the session. Every `report_every` frames the gaps
//! of all present cars relative to the reference car are computed,
//! optionally smoothed, recorded as metrics and written to stdout.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::GapBlueprint;
use gap_engine::{
    detect_edge_cases, GapParams, GapSession, GapSmoother, LapCounters, ObjectId,
    RelativeGapResult,
};
use ingestion::{IngestionMetrics, TelemetryFrame, TelemetryReplay};
use observability::{record_frame_processed, record_gap_metrics, record_lap_history_depth};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::ReplayStats;

/// Longest pause inserted between two frames in realtime mode
const MAX_REALTIME_STEP: Duration = Duration::from_secs(2);

/// How gap reports are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable table
    Table,
    /// One JSON object per gap
    JsonLines,
}

/// Replay configuration
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Engine configuration
    pub blueprint: GapBlueprint,

    /// Recording to replay
    pub input: PathBuf,

    /// Car gaps are reported relative to
    pub reference: ObjectId,

    /// Report every N frames
    pub report_every: u64,

    /// Apply exponential smoothing to reported gaps
    pub smooth: bool,

    pub format: ReportFormat,

    /// Sleep between frames according to recorded session time
    pub realtime: bool,

    /// Maximum number of frames to process (None = whole recording)
    pub max_frames: Option<u64>,

    /// Abort on malformed lines
    pub strict: bool,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// One reported gap
#[derive(Debug, Clone, Serialize)]
pub struct GapReport {
    pub session_time: f64,
    pub reference_id: ObjectId,
    pub other_id: ObjectId,
    #[serde(flatten)]
    pub result: RelativeGapResult,
}

/// Replay driver
pub struct Replayer {
    config: ReplayConfig,
}

impl Replayer {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    /// Run the replay to completion
    pub async fn run(self) -> Result<ReplayStats> {
        let start_time = Instant::now();
        let config = &self.config;

        if let Some(port) = config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let ingestion_metrics = Arc::new(IngestionMetrics::new());
        let replay = TelemetryReplay::open(&config.input)
            .with_context(|| format!("Failed to open recording {}", config.input.display()))?
            .with_metrics(Arc::clone(&ingestion_metrics));

        let fallback_lap_time = config.blueprint.estimates.fallback_lap_time;
        let mut session = GapSession::new(config.blueprint.gap.clone());
        let mut smoother = GapSmoother::new(config.blueprint.gap.smoothing_factor);
        let mut counters = LapCounters::new();
        let mut stats = ReplayStats::default();
        let mut previous_time: Option<f64> = None;

        info!(
            input = %config.input.display(),
            reference = config.reference,
            report_every = config.report_every,
            smooth = config.smooth,
            "Starting replay"
        );

        for item in replay {
            let frame = match item {
                Ok(frame) => frame,
                Err(e) if !config.strict => {
                    debug!(error = %e, "Skipping malformed frame");
                    continue;
                }
                Err(e) => return Err(e).context("Malformed telemetry recording"),
            };

            if config.max_frames.is_some_and(|max| stats.frames >= max) {
                info!(frames = stats.frames, "Frame limit reached");
                break;
            }

            if config.realtime {
                pace(previous_time, frame.batch.session_time).await;
            }
            previous_time = Some(frame.batch.session_time);

            if session
                .session_id()
                .is_some_and(|id| id != frame.batch.session_id)
            {
                // lap counters and smoothed series belong to the old session
                counters.clear();
                smoother.reset();
                stats.gap_metrics.record_session_reset();
            }

            counters = session.update(&frame.batch, counters);
            stats.frames += 1;
            stats.gap_metrics.record_frame();
            record_frame_processed(session.histories().len());

            if stats.frames % config.report_every != 0 {
                continue;
            }

            let mut reports = gap_reports(&session, &frame, config.reference, fallback_lap_time);
            if reports.is_empty() {
                debug!(
                    session_time = frame.batch.session_time,
                    "Reference car not present, no report"
                );
            }
            for report in &mut reports {
                if config.smooth {
                    report.result = smoother
                        .smooth((report.reference_id, report.other_id), report.result);
                }
                record_gap_metrics(report.other_id, &report.result);
                stats.gap_metrics.update(&report.result);
            }
            record_lap_history_depth(total_laps(&session));
            stats.reports += 1;

            write_reports(&reports, config.format)?;
            tokio::task::yield_now().await;
        }

        let snapshot = ingestion_metrics.snapshot();
        stats.parse_errors = snapshot.parse_errors;
        if snapshot.parse_errors > 0 {
            warn!(
                parse_errors = snapshot.parse_errors,
                "Recording contained malformed lines"
            );
        }
        stats.objects_tracked = session.histories().len();
        stats.laps_archived = total_laps(&session);
        stats.duration = start_time.elapsed();

        Ok(stats)
    }
}

/// Gaps of every present car relative to `reference` for one frame
///
/// Empty when the reference car carries no usable position this frame.
/// Edge-case flags describe the other car; the first-lap flag is set when
/// either car is on its first lap or has no archived laps yet.
pub fn gap_reports(
    session: &GapSession,
    frame: &TelemetryFrame,
    reference: ObjectId,
    fallback_lap_time: f64,
) -> Vec<GapReport> {
    if !frame.is_present(reference) {
        return Vec::new();
    }

    let batch = &frame.batch;
    let reference_position = batch.positions[reference];
    let reference_lap = batch.lap_numbers[reference];
    let reference_has_laps = session
        .history(reference)
        .is_some_and(|history| history.has_lap_history());
    let reference_est = frame.est_lap_time(reference, fallback_lap_time);

    (0..batch.object_count())
        .filter(|&other| other != reference && frame.is_present(other))
        .map(|other| {
            let other_lap = batch.lap_numbers[other];
            let other_has_laps = session
                .history(other)
                .is_some_and(|history| history.has_lap_history());

            let params = GapParams {
                reference_id: reference,
                other_id: other,
                reference_position,
                other_position: batch.positions[other],
                reference_lap,
                other_lap,
                session_time: batch.session_time,
            };
            let flags = detect_edge_cases(
                frame.is_off_track(other),
                frame.is_in_pits(other),
                reference_lap.min(other_lap),
                reference_has_laps && other_has_laps,
            );
            let result = session.relative_gap(
                &params,
                reference_est,
                frame.est_lap_time(other, fallback_lap_time),
                &flags,
            );

            GapReport {
                session_time: batch.session_time,
                reference_id: reference,
                other_id: other,
                result,
            }
        })
        .collect()
}

fn total_laps(session: &GapSession) -> usize {
    session
        .histories()
        .values()
        .map(|history| history.lap_records.len())
        .sum()
}

async fn pace(previous: Option<f64>, current: f64) {
    let Some(previous) = previous else {
        return;
    };
    let delta = current - previous;
    if delta.is_finite() && delta > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(delta).min(MAX_REALTIME_STEP)).await;
    }
}

fn write_reports(reports: &[GapReport], format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::JsonLines => {
            for report in reports {
                let line =
                    serde_json::to_string(report).context("Failed to serialize gap report")?;
                println!("{}", line);
            }
        }
        ReportFormat::Table => {
            if let Some(first) = reports.first() {
                println!(
                    "\n[t={:>9.3}s] gaps relative to car {}",
                    first.session_time, first.reference_id
                );
            }
            for report in reports {
                println!("{}", format_report_row(report));
            }
        }
    }
    Ok(())
}

/// One table row: car, signed gap, tier, confidence
pub fn format_report_row(report: &GapReport) -> String {
    let result = &report.result;
    format!(
        "  car {:>3}  {:>+9.3}s  {:<17} conf {:.2}{}",
        report.other_id,
        result.time_gap,
        result.tier.as_str(),
        result.confidence,
        if result.is_estimated { "  (est)" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gap_engine::{GapConfig, GapTier, TelemetryBatch};
    use ingestion::{MockTelemetryConfig, MockTelemetrySource};

    fn frame(positions: Vec<f64>, lap_numbers: Vec<i32>) -> TelemetryFrame {
        TelemetryFrame {
            batch: TelemetryBatch {
                session_time: 10.0,
                session_id: 1,
                track_length: 4000.0,
                positions,
                lap_numbers,
                last_lap_times: Vec::new(),
            },
            est_lap_times: vec![100.0, 100.0, 100.0],
            on_pit_road: Vec::new(),
            off_track: Vec::new(),
        }
    }

    #[test]
    fn test_reports_skip_reference_and_absent_cars() {
        let mut session = GapSession::new(GapConfig::default());
        let frame = frame(vec![0.5, 0.6, -1.0], vec![1, 1, -1]);
        session.update(&frame.batch, LapCounters::new());

        let reports = gap_reports(&session, &frame, 0, 90.0);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].other_id, 1);
        assert_eq!(reports[0].result.tier, GapTier::ClassEstimate);
        assert!((reports[0].result.time_gap - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_absent_reference_yields_no_reports() {
        let session = GapSession::new(GapConfig::default());
        let frame = frame(vec![-1.0, 0.6], vec![-1, 1]);
        assert!(gap_reports(&session, &frame, 0, 90.0).is_empty());
        assert!(gap_reports(&session, &frame, 5, 90.0).is_empty());
    }

    #[test]
    fn test_mock_session_reaches_position_records() {
        let source = MockTelemetrySource::new(MockTelemetryConfig {
            cars: 3,
            laps: 2,
            tick_hz: 20.0,
            base_lap_time: 40.0,
            lap_variation: 0.0,
            ..Default::default()
        });
        let mut session = GapSession::new(GapConfig::default());
        let mut counters = LapCounters::new();
        let mut last = None;
        for frame in source {
            counters = session.update(&frame.batch, counters);
            last = Some(frame);
        }

        let last = last.unwrap();
        let reports = gap_reports(&session, &last, 0, 90.0);
        assert_eq!(reports.len(), 2);
        assert!(
            reports
                .iter()
                .all(|report| report.result.tier == GapTier::PositionRecords),
            "got: {reports:?}"
        );
    }

    #[test]
    fn test_table_row_format() {
        let report = GapReport {
            session_time: 12.0,
            reference_id: 0,
            other_id: 7,
            result: RelativeGapResult {
                time_gap: -1.5,
                tier: GapTier::LapHistory,
                confidence: 0.6,
                is_estimated: true,
                distance_gap: -0.015,
            },
        };
        let row = format_report_row(&report);
        assert!(row.contains("car   7"), "got: {row}");
        assert!(row.contains("-1.500s"), "got: {row}");
        assert!(row.contains("lap-history"), "got: {row}");
        assert!(row.ends_with("(est)"), "got: {row}");
    }

    #[test]
    fn test_report_json_is_flat() {
        let report = GapReport {
            session_time: 1.0,
            reference_id: 0,
            other_id: 1,
            result: RelativeGapResult {
                time_gap: 2.0,
                tier: GapTier::PositionRecords,
                confidence: 1.0,
                is_estimated: false,
                distance_gap: 0.02,
            },
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"tier\":\"position-records\""), "got: {json}");
        assert!(json.contains("\"other_id\":1"), "got: {json}");
    }
}
