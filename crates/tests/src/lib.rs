//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - contract defaults and config files
//! - mock telemetry -> session -> gap estimation (no recorded data needed)
//! - recording and replaying sessions on disk

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ConfigVersion, GapBlueprint, InterpolationMethod};

    #[test]
    fn test_default_blueprint_is_valid() {
        let blueprint = GapBlueprint::default();
        assert_eq!(blueprint.version, ConfigVersion::V1);
        assert!(ConfigLoader::validate(&blueprint).is_ok());
    }

    #[test]
    fn test_blueprint_survives_toml_and_json() {
        let mut blueprint = GapBlueprint::default();
        blueprint.gap.interpolation_method = InterpolationMethod::Cubic;
        blueprint.gap.max_lap_history = 3;

        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let from_toml = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(from_toml, blueprint);

        let json = ConfigLoader::to_json(&blueprint).unwrap();
        let from_json = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(from_json, blueprint);
    }
}

#[cfg(test)]
mod e2e_tests {
    use config_loader::ConfigLoader;
    use gap_engine::{
        detect_edge_cases, GapConfig, GapConfigUpdate, GapParams, GapSession, GapTier,
        LapCounters, ObjectId, RelativeGapResult,
    };
    use ingestion::{
        MockTelemetryConfig, MockTelemetrySource, TelemetryFrame, TelemetryRecorder,
        TelemetryReplay,
    };
    use observability::GapMetricsAggregator;
    use tokio::sync::mpsc;

    fn mock_config(cars: usize, laps: u32) -> MockTelemetryConfig {
        MockTelemetryConfig {
            cars,
            laps,
            tick_hz: 20.0,
            base_lap_time: 30.0,
            pace_spread: 1.5,
            lap_variation: 0.0,
            ..Default::default()
        }
    }

    /// Gap of `other` relative to `reference` the way a host would ask
    fn gap(
        session: &GapSession,
        frame: &TelemetryFrame,
        reference: ObjectId,
        other: ObjectId,
    ) -> RelativeGapResult {
        let batch = &frame.batch;
        let params = GapParams {
            reference_id: reference,
            other_id: other,
            reference_position: batch.positions[reference],
            other_position: batch.positions[other],
            reference_lap: batch.lap_numbers[reference],
            other_lap: batch.lap_numbers[other],
            session_time: batch.session_time,
        };
        let has_laps = |id| {
            session
                .history(id)
                .is_some_and(|history| history.has_lap_history())
        };
        let flags = detect_edge_cases(
            frame.is_off_track(other),
            frame.is_in_pits(other),
            params.reference_lap.min(params.other_lap),
            has_laps(reference) && has_laps(other),
        );
        session.relative_gap(
            &params,
            frame.est_lap_time(reference, 90.0),
            frame.est_lap_time(other, 90.0),
            &flags,
        )
    }

    /// End-to-end test: MockTelemetrySource -> GapSession -> gap estimation
    ///
    /// Early frames only have class estimates; once every car has an
    /// archived lap the gap comes from the recorded position curves.
    #[test]
    fn test_e2e_tiers_progress_with_history() {
        let mut session = GapSession::new(GapConfig::default());
        let mut counters = LapCounters::new();
        let mut aggregator = GapMetricsAggregator::new();
        let mut first_tier = None;
        let mut last = None;

        for frame in MockTelemetrySource::new(mock_config(3, 3)) {
            counters = session.update(&frame.batch, counters);
            aggregator.record_frame();

            let result = gap(&session, &frame, 0, 1);
            first_tier.get_or_insert(result.tier);
            aggregator.update(&result);
            last = Some(frame);
        }

        assert_eq!(first_tier, Some(GapTier::ClassEstimate));

        let last = last.unwrap();
        let result = gap(&session, &last, 0, 1);
        assert_eq!(result.tier, GapTier::PositionRecords);
        assert!(!result.is_estimated);

        // car 1 starts behind and is slower: it stays behind
        assert!(result.time_gap < 0.0, "got: {result:?}");
        assert!(
            (result.time_gap - result.distance_gap * 30.5).abs() < 1.0,
            "got: {result:?}"
        );

        let summary = aggregator.summary();
        assert_eq!(summary.total_frames, aggregator.total_gaps);
        assert!(summary.tiers[0].count > 0);
        assert!(summary.tiers[2].count > 0);
    }

    #[test]
    fn test_session_change_discards_history() {
        let mut session = GapSession::new(GapConfig::default());
        let mut counters = LapCounters::new();
        let mut last = None;
        for frame in MockTelemetrySource::new(mock_config(2, 2)) {
            counters = session.update(&frame.batch, counters);
            last = Some(frame);
        }
        assert!(session.histories().values().all(|h| h.has_lap_history()));

        let mut next = last.unwrap();
        next.batch.session_id += 1;
        next.batch.session_time = 0.0;
        session.update(&next.batch, LapCounters::new());

        assert_eq!(session.session_id(), Some(next.batch.session_id));
        assert!(session.histories().values().all(|h| !h.has_lap_history()));
        assert_eq!(gap(&session, &next, 0, 1).tier, GapTier::ClassEstimate);
    }

    #[test]
    fn test_history_is_fifo_bounded() {
        let config = GapConfig {
            max_lap_history: 3,
            ..Default::default()
        };
        let mut session = GapSession::new(config);
        let mut counters = LapCounters::new();
        for frame in MockTelemetrySource::new(mock_config(2, 6)) {
            counters = session.update(&frame.batch, counters);
        }

        for history in session.histories().values() {
            assert_eq!(history.lap_records.len(), 3);
            let laps: Vec<i32> = history.lap_records.iter().map(|l| l.lap_number).collect();
            // out lap is never archived; laps 2..=7 were timed
            assert_eq!(laps, vec![5, 6, 7], "object {}", history.id);
        }

        session.update_config(&GapConfigUpdate {
            max_lap_history: Some(1),
            ..Default::default()
        });
        for history in session.histories().values() {
            assert_eq!(history.lap_records.len(), 1);
            assert_eq!(history.lap_records[0].lap_number, 7);
        }
    }

    #[test]
    fn test_dropouts_and_noise_do_not_break_estimation() {
        let config = MockTelemetryConfig {
            position_noise: 0.001,
            dropout_probability: 0.05,
            off_track_probability: 0.01,
            ..mock_config(4, 3)
        };
        let mut session = GapSession::new(GapConfig::default());
        let mut counters = LapCounters::new();

        for frame in MockTelemetrySource::new(config) {
            counters = session.update(&frame.batch, counters);
            if !(frame.is_present(0) && frame.is_present(3)) {
                continue;
            }
            let result = gap(&session, &frame, 0, 3);
            assert!(result.time_gap.is_finite(), "got: {result:?}");
            assert!((0.0..=1.0).contains(&result.confidence), "got: {result:?}");
            if frame.is_off_track(3) {
                assert_eq!(result.time_gap, 0.0);
                assert_eq!(result.confidence, 0.1);
            }
        }
    }

    #[test]
    fn test_recorded_session_replays_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");

        let mut direct = GapSession::new(GapConfig::default());
        let mut direct_counters = LapCounters::new();
        let mut recorder = TelemetryRecorder::create(&path).unwrap();
        for frame in MockTelemetrySource::new(mock_config(3, 2)) {
            direct_counters = direct.update(&frame.batch, direct_counters);
            recorder.record(&frame).unwrap();
        }
        recorder.flush().unwrap();
        let written = recorder.frames_written();
        drop(recorder);

        let mut replayed = GapSession::new(GapConfig::default());
        let mut counters = LapCounters::new();
        let mut frames = 0;
        for frame in TelemetryReplay::open(&path).unwrap() {
            counters = replayed.update(&frame.unwrap().batch, counters);
            frames += 1;
        }

        assert_eq!(frames, written);
        assert_eq!(counters, direct_counters);
        for (id, history) in direct.histories() {
            let other = replayed.history(*id).unwrap();
            assert_eq!(other.lap_records.len(), history.lap_records.len());
            for (a, b) in history.lap_records.iter().zip(&other.lap_records) {
                assert_eq!(a.lap_number, b.lap_number);
                assert!((a.lap_time - b.lap_time).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_config_file_controls_sampling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relgap.toml");
        std::fs::write(
            &path,
            "version = \"V1\"\n\n[gap]\nsample_interval = 0.05\nmax_lap_history = 2\ninterpolation_method = \"cubic\"\n",
        )
        .unwrap();

        let blueprint = ConfigLoader::load_from_path(&path).unwrap();
        let mut session = GapSession::new(blueprint.gap);
        let mut counters = LapCounters::new();
        let mut last = None;
        for frame in MockTelemetrySource::new(mock_config(2, 3)) {
            counters = session.update(&frame.batch, counters);
            last = Some(frame);
        }

        for history in session.histories().values() {
            assert_eq!(history.lap_records.len(), 2);
            for lap in &history.lap_records {
                assert!(
                    (10..=21).contains(&lap.samples.len()),
                    "got {} samples",
                    lap.samples.len()
                );
            }
        }
        let result = gap(&session, &last.unwrap(), 1, 0);
        assert_eq!(result.tier, GapTier::PositionRecords);
        assert!(result.time_gap > 0.0, "got: {result:?}");
    }

    #[test]
    fn test_disabled_sampling_falls_back_to_estimates() {
        let config = GapConfig {
            enabled: false,
            ..Default::default()
        };
        let mut session = GapSession::new(config);
        let mut counters = LapCounters::new();
        let mut last = None;
        for frame in MockTelemetrySource::new(mock_config(2, 2)) {
            counters = session.update(&frame.batch, counters);
            last = Some(frame);
        }

        assert!(session
            .histories()
            .values()
            .all(|h| h.current_lap_samples.is_empty() && !h.has_lap_history()));
        assert_eq!(
            gap(&session, &last.unwrap(), 0, 1).tier,
            GapTier::ClassEstimate
        );
    }

    /// Frames delivered over a channel, the way a live host would feed them
    #[tokio::test]
    async fn test_e2e_channel_pipeline() {
        let (tx, mut rx) = mpsc::channel::<TelemetryFrame>(64);

        let producer = tokio::spawn(async move {
            for frame in MockTelemetrySource::new(mock_config(3, 2)) {
                if tx.send(frame).await.is_err() {
                    break;
                }
            }
        });

        let consumer = tokio::spawn(async move {
            let mut session = GapSession::new(GapConfig::default());
            let mut counters = LapCounters::new();
            let mut aggregator = GapMetricsAggregator::new();
            let mut last = None;
            while let Some(frame) = rx.recv().await {
                counters = session.update(&frame.batch, counters);
                aggregator.record_frame();
                last = Some(frame);
            }
            let last = last.unwrap();
            for other in 1..3 {
                aggregator.update(&gap(&session, &last, 0, other));
            }
            aggregator
        });

        producer.await.unwrap();
        let aggregator = consumer.await.unwrap();

        assert!(aggregator.total_frames > 0);
        assert_eq!(aggregator.total_gaps, 2);
        assert_eq!(
            aggregator.tier_counts.get(&GapTier::PositionRecords),
            Some(&2)
        );
    }
}
