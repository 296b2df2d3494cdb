//! Three-tier relative gap estimator.
//!
//! Tiers are tried in order of decreasing accuracy; the first one that can
//! produce a result wins. The final tier never fails, so every query
//! yields a [`RelativeGapResult`].

use contracts::{
    EdgeCaseFlags, GapParams, GapTier, InterpolationMethod, ObjectHistory, RelativeGapResult,
    MIN_SAMPLES_PER_LAP,
};

use crate::interpolation::{interpolate_time, median_lap_time, position_difference};

/// Positions closer than this are considered side by side
const SAME_POSITION_EPSILON: f64 = 0.001;

const TIER2_BASE_CONFIDENCE: f64 = 0.4;
const TIER2_CONFIDENCE_PER_LAP: f64 = 0.1;
const TIER2_MAX_CONFIDENCE: f64 = 0.8;
const TIER3_CONFIDENCE: f64 = 0.3;
const GUARD_CONFIDENCE: f64 = 0.1;

/// Gap of `other` relative to `reference` (positive = `other` ahead)
///
/// Off-track and glitch flags short-circuit to a zero gap with minimal
/// confidence. Missing histories simply skip the tiers that need them.
pub fn compute_relative_gap(
    reference: Option<&ObjectHistory>,
    other: Option<&ObjectHistory>,
    params: &GapParams,
    reference_est_lap_time: f64,
    other_est_lap_time: f64,
    edge_cases: &EdgeCaseFlags,
    method: InterpolationMethod,
) -> RelativeGapResult {
    let result = select_tier(
        reference,
        other,
        params,
        reference_est_lap_time,
        other_est_lap_time,
        edge_cases,
        method,
    );

    metrics::counter!("relgap_gap_tier_total", "tier" => result.tier.as_str()).increment(1);
    metrics::histogram!("relgap_gap_confidence").record(result.confidence);

    result
}

fn select_tier(
    reference: Option<&ObjectHistory>,
    other: Option<&ObjectHistory>,
    params: &GapParams,
    reference_est_lap_time: f64,
    other_est_lap_time: f64,
    edge_cases: &EdgeCaseFlags,
    method: InterpolationMethod,
) -> RelativeGapResult {
    if edge_cases.is_off_track || edge_cases.is_telemetry_glitch {
        return RelativeGapResult {
            time_gap: 0.0,
            tier: GapTier::ClassEstimate,
            confidence: GUARD_CONFIDENCE,
            is_estimated: true,
            distance_gap: 0.0,
        };
    }

    if let (Some(reference), Some(other)) = (reference, other) {
        if !edge_cases.is_first_lap {
            let attempt = try_position_records(reference, other, params, method)
                .or_else(|| try_lap_history(reference, other, params));
            if let Some(result) = attempt {
                return result;
            }
        }
    }

    class_estimate(params, reference_est_lap_time, other_est_lap_time)
}

/// Tier 1: interpolate on recorded position/time curves
///
/// Both objects need a valid lap with enough samples. The gap itself is
/// measured on the other object's curve.
pub fn try_position_records(
    reference: &ObjectHistory,
    other: &ObjectHistory,
    params: &GapParams,
    method: InterpolationMethod,
) -> Option<RelativeGapResult> {
    let other_lap = other
        .latest_valid_lap()
        .filter(|lap| lap.samples.len() >= MIN_SAMPLES_PER_LAP)?;
    let reference_lap = reference
        .latest_valid_lap()
        .filter(|lap| lap.samples.len() >= MIN_SAMPLES_PER_LAP)?;

    let distance_gap = position_difference(params.reference_position, params.other_position);

    if distance_gap.abs() < SAME_POSITION_EPSILON {
        let other_at = interpolate_time(&other_lap.samples, params.other_position, method);
        let reference_at =
            interpolate_time(&reference_lap.samples, params.reference_position, method);
        return Some(RelativeGapResult {
            time_gap: 0.0,
            tier: GapTier::PositionRecords,
            confidence: other_at.confidence.min(reference_at.confidence),
            is_estimated: false,
            distance_gap,
        });
    }

    let other_at = interpolate_time(&other_lap.samples, params.other_position, method);
    let reference_at = interpolate_time(&other_lap.samples, params.reference_position, method);

    let half_lap = other_lap.lap_time / 2.0;
    let mut time_gap = other_at.time - reference_at.time;
    if time_gap > half_lap {
        time_gap -= other_lap.lap_time;
    } else if time_gap < -half_lap {
        time_gap += other_lap.lap_time;
    }

    Some(RelativeGapResult {
        time_gap,
        tier: GapTier::PositionRecords,
        confidence: other_at.confidence.min(reference_at.confidence),
        is_estimated: !(other_at.is_interpolated && reference_at.is_interpolated),
        distance_gap,
    })
}

/// Tier 2: scale the distance by the other object's median lap time
pub fn try_lap_history(
    reference: &ObjectHistory,
    other: &ObjectHistory,
    params: &GapParams,
) -> Option<RelativeGapResult> {
    median_lap_time(&reference.lap_records)?;
    let other_median = median_lap_time(&other.lap_records)?;

    let distance_gap = position_difference(params.reference_position, params.other_position);
    let confidence = (TIER2_BASE_CONFIDENCE
        + TIER2_CONFIDENCE_PER_LAP * other.valid_lap_count() as f64)
        .min(TIER2_MAX_CONFIDENCE);

    Some(RelativeGapResult {
        time_gap: distance_gap * other_median,
        tier: GapTier::LapHistory,
        confidence,
        is_estimated: true,
        distance_gap,
    })
}

/// Tier 3: scale the distance by an externally estimated lap time
pub fn class_estimate(
    params: &GapParams,
    reference_est_lap_time: f64,
    other_est_lap_time: f64,
) -> RelativeGapResult {
    let distance_gap = position_difference(params.reference_position, params.other_position);
    let base_lap_time = if other_est_lap_time > 0.0 {
        other_est_lap_time
    } else {
        reference_est_lap_time
    };

    RelativeGapResult {
        time_gap: distance_gap * base_lap_time,
        tier: GapTier::ClassEstimate,
        confidence: TIER3_CONFIDENCE,
        is_estimated: true,
        distance_gap,
    }
}

/// Derive the edge-case flags for one object
///
/// Lapped and glitch detection are not derived here and stay `false`.
pub fn detect_edge_cases(
    is_off_track: bool,
    is_in_pits: bool,
    current_lap: i32,
    has_lap_history: bool,
) -> EdgeCaseFlags {
    EdgeCaseFlags {
        is_off_track,
        is_in_pits,
        is_first_lap: current_lap <= 1 || !has_lap_history,
        is_lapped: false,
        is_telemetry_glitch: false,
    }
}

/// Plain distance gap using the slower of the two estimates
pub fn simple_distance_gap(
    reference_position: f64,
    other_position: f64,
    reference_est_lap_time: f64,
    other_est_lap_time: f64,
) -> f64 {
    position_difference(reference_position, other_position)
        * reference_est_lap_time.max(other_est_lap_time)
}
