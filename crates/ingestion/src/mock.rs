//! Mock telemetry source
//!
//! Deterministic synthetic sessions for tests and demos: every car runs
//! at its own pace with per-lap variation, optional position noise and
//! occasional telemetry dropouts. The same seed always produces the same
//! frames.

use contracts::TelemetryBatch;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::frame::TelemetryFrame;

/// Mock telemetry configuration
#[derive(Debug, Clone)]
pub struct MockTelemetryConfig {
    /// Number of cars
    pub cars: usize,

    /// Timed laps each car completes before the source ends
    pub laps: u32,

    /// Telemetry rate (Hz)
    pub tick_hz: f64,

    /// Pace of the fastest car (seconds)
    pub base_lap_time: f64,

    /// Pace difference between the fastest and slowest car (seconds)
    pub pace_spread: f64,

    /// Relative lap-to-lap variation (0.01 = ±1%)
    pub lap_variation: f64,

    /// Amplitude of noise added to reported positions
    pub position_noise: f64,

    /// Probability that a car is missing from a tick
    pub dropout_probability: f64,

    /// Probability that a car is flagged off track on a tick
    pub off_track_probability: f64,

    pub session_id: i64,

    /// Track length (meters)
    pub track_length: f64,

    pub seed: u64,
}

impl Default for MockTelemetryConfig {
    fn default() -> Self {
        Self {
            cars: 4,
            laps: 5,
            tick_hz: 60.0,
            base_lap_time: 90.0,
            pace_spread: 4.0,
            lap_variation: 0.01,
            position_noise: 0.0,
            dropout_probability: 0.0,
            off_track_probability: 0.0,
            session_id: 1,
            track_length: 4000.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
struct CarState {
    /// Nominal pace, reported as the class estimate
    pace: f64,
    /// Duration of the lap in progress
    lap_time: f64,
    position: f64,
    lap: i32,
    lap_started_at: f64,
    last_lap_time: f64,
    completed_laps: u32,
}

/// Mock telemetry source
///
/// Iterates over frames until every car has completed the configured
/// number of timed laps. The first crossing of the line ends the out lap
/// and reports no lap time.
pub struct MockTelemetrySource {
    config: MockTelemetryConfig,
    rng: StdRng,
    cars: Vec<CarState>,
    tick: u64,
    started: bool,
    finished: bool,
}

impl MockTelemetrySource {
    pub fn new(config: MockTelemetryConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let count = config.cars.max(1) as f64;

        let cars = (0..config.cars)
            .map(|idx| {
                let pace = config.base_lap_time + config.pace_spread * idx as f64 / count;
                let lap_time = vary(&mut rng, pace, config.lap_variation);
                CarState {
                    pace,
                    lap_time,
                    // staggered grid just after the line
                    position: 0.2 * (config.cars - idx) as f64 / count,
                    lap: 1,
                    lap_started_at: 0.0,
                    last_lap_time: -1.0,
                    completed_laps: 0,
                }
            })
            .collect();

        debug!(
            cars = config.cars,
            laps = config.laps,
            seed = config.seed,
            "mock telemetry source created"
        );

        Self {
            config,
            rng,
            cars,
            tick: 0,
            started: false,
            finished: false,
        }
    }

    pub fn config(&self) -> &MockTelemetryConfig {
        &self.config
    }

    /// Nominal pace of each car (seconds)
    pub fn paces(&self) -> Vec<f64> {
        self.cars.iter().map(|car| car.pace).collect()
    }

    fn session_time(&self) -> f64 {
        self.tick as f64 / self.config.tick_hz
    }

    /// Advance every car by one tick
    fn step(&mut self) {
        let dt = 1.0 / self.config.tick_hz;
        self.tick += 1;
        let now = self.session_time();
        let variation = self.config.lap_variation;

        for car in &mut self.cars {
            car.position += dt / car.lap_time;
            if car.position >= 1.0 {
                car.position -= 1.0;
                // first crossing ends the out lap
                car.last_lap_time = if car.lap > 1 {
                    now - car.lap_started_at
                } else {
                    -1.0
                };
                if car.lap > 1 {
                    car.completed_laps += 1;
                }
                car.lap += 1;
                car.lap_started_at = now;
                car.lap_time = vary(&mut self.rng, car.pace, variation);
                trace!(lap = car.lap, last_lap_time = car.last_lap_time, "mock car crossed line");
            }
        }
    }

    fn frame(&mut self) -> TelemetryFrame {
        let count = self.cars.len();
        let mut positions = Vec::with_capacity(count);
        let mut lap_numbers = Vec::with_capacity(count);
        let mut last_lap_times = Vec::with_capacity(count);
        let mut off_track = Vec::with_capacity(count);

        let noise = self.config.position_noise;
        let dropout = self.config.dropout_probability.clamp(0.0, 1.0);
        let off_track_probability = self.config.off_track_probability.clamp(0.0, 1.0);

        for car in &self.cars {
            if dropout > 0.0 && self.rng.random_bool(dropout) {
                positions.push(-1.0);
                lap_numbers.push(-1);
                last_lap_times.push(car.last_lap_time);
                off_track.push(false);
                continue;
            }

            let mut position = car.position;
            if noise > 0.0 {
                position = (position + self.rng.random_range(-noise..noise)).rem_euclid(1.0);
                if position >= 1.0 {
                    position = 0.0;
                }
            }
            positions.push(position);
            lap_numbers.push(car.lap);
            last_lap_times.push(car.last_lap_time);
            off_track.push(off_track_probability > 0.0 && self.rng.random_bool(off_track_probability));
        }

        TelemetryFrame {
            batch: TelemetryBatch {
                session_time: self.session_time(),
                session_id: self.config.session_id,
                track_length: self.config.track_length,
                positions,
                lap_numbers,
                last_lap_times,
            },
            est_lap_times: self.cars.iter().map(|car| car.pace).collect(),
            on_pit_road: vec![false; count],
            off_track,
        }
    }
}

impl Iterator for MockTelemetrySource {
    type Item = TelemetryFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.started {
            self.step();
        }
        self.started = true;
        if self
            .cars
            .iter()
            .all(|car| car.completed_laps >= self.config.laps)
        {
            // emit the frame that shows the final crossing, then stop
            self.finished = true;
        }
        Some(self.frame())
    }
}

/// Lap time around `pace` with relative `variation`
fn vary(rng: &mut StdRng, pace: f64, variation: f64) -> f64 {
    if variation <= 0.0 {
        return pace;
    }
    pace * (1.0 + rng.random_range(-variation..variation))
}
