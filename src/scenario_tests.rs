/// End-to-end wake cycle scenarios: scripted distances, a fake clock and a
/// recording uplink, stepping the controller the way `main` does.

#[cfg(test)]
mod scenario_tests {
    use std::time::Duration;

    use crate::cycle::{CycleReport, WakeCycle};
    use crate::events::{CycleOutcome, UploadResult};
    use crate::power::{RetainedPresence, WakeCause};
    use crate::presence::PresenceState;
    use crate::settings::{ConfirmationWindow, Settings};
    use crate::testing::{FakeClock, RecordingUplink, ScriptedSensor};
    use crate::wait::Clock;

    fn variant_one() -> Settings {
        Settings {
            movement_threshold_cm: 50.0,
            sustained_threshold: Duration::from_millis(15_000),
            confirmation: None,
            ..Settings::default()
        }
    }

    fn variant_two() -> Settings {
        Settings {
            confirmation: Some(ConfirmationWindow {
                duration: Duration::from_millis(3000),
                poll_interval: Duration::from_millis(500),
            }),
            ..variant_one()
        }
    }

    /// Run one cycle per scripted sample, `spacing` apart, starting at t = 0.
    fn run_spaced(
        settings: &Settings,
        distances: &[f32],
        spacing: Duration,
    ) -> (Vec<(u64, CycleReport)>, RecordingUplink) {
        let clock = FakeClock::new(0);
        let uplink = RecordingUplink::default();
        let mut cycle = WakeCycle::new(
            settings,
            ScriptedSensor::new(distances),
            uplink.clone(),
            clock.clone(),
        );

        let mut state = PresenceState::Idle;
        let mut reports = Vec::new();
        for i in 0..distances.len() as u64 {
            let t = i * spacing.as_millis() as u64;
            clock.set(t);
            let report = cycle.run_cycle(state);
            state = report.state;
            reports.push((t, report));
        }
        (reports, uplink)
    }

    #[test]
    fn sustained_presence_uploads_once_with_last_distance() {
        let mut distances = vec![80.0, 80.0];
        distances.extend(std::iter::repeat(40.0).take(15)); // t = 2..16 s
        distances.push(38.5); // t = 17 s, 15 s after entry
        distances.extend(std::iter::repeat(40.0).take(10)); // still there afterwards

        let (reports, uplink) = run_spaced(&variant_one(), &distances, Duration::from_secs(1));

        assert_eq!(uplink.uploads(), vec![38.5]);
        let uploaded_at: Vec<u64> = reports
            .iter()
            .filter(|(_, r)| r.outcome.uploaded())
            .map(|(t, _)| *t)
            .collect();
        assert_eq!(uploaded_at, vec![17_000]);
        // Detection restarts after the upload rather than re-firing.
        assert_eq!(
            reports.last().map(|(_, r)| r.state),
            Some(PresenceState::Detecting { since_ms: 18_000 })
        );
    }

    #[test]
    fn short_presence_then_away_never_uploads() {
        let (reports, uplink) =
            run_spaced(&variant_one(), &[40.0, 40.0, 60.0], Duration::from_secs(1));

        assert!(uplink.calls().is_empty());
        assert_eq!(reports[1].1.state, PresenceState::Detecting { since_ms: 0 });
        assert_eq!(reports[2].1.state, PresenceState::Idle);
        assert!(reports.iter().all(|(_, r)| r.outcome == CycleOutcome::SleepOnly));
    }

    #[test]
    fn upload_failure_is_absorbed_and_next_detection_proceeds() {
        let clock = FakeClock::new(0);
        let uplink = RecordingUplink::failing_upload();
        let sensor = ScriptedSensor::new(&[30.0]);
        let mut cycle = WakeCycle::new(&variant_one(), sensor.clone(), uplink.clone(), clock.clone());

        let mut state = PresenceState::Idle;
        let mut outcomes = Vec::new();
        for t in (0..=40_000).step_by(5_000) {
            clock.set(t);
            let report = cycle.run_cycle(state);
            state = report.state;
            outcomes.push(report.outcome);
        }

        let failed = CycleOutcome::UploadAttempted(UploadResult::UploadFailed);
        // 0 → 15 s fires, then re-detect at 20 s → 35 s fires.
        assert_eq!(outcomes.iter().filter(|o| **o == failed).count(), 2);
        assert_eq!(outcomes[3], failed);
        assert_eq!(outcomes[7], failed);
        assert_eq!(sensor.reads(), 9);
    }

    #[test]
    fn confirmation_aborts_when_object_leaves() {
        let clock = FakeClock::new(15_000);
        let uplink = RecordingUplink::default();
        let sensor = ScriptedSensor::new(&[30.0, 30.0, 30.0, 70.0, 30.0]);
        let mut cycle = WakeCycle::new(&variant_two(), sensor.clone(), uplink.clone(), clock.clone());

        let report = cycle.run_cycle(PresenceState::Detecting { since_ms: 0 });

        assert_eq!(report.outcome, CycleOutcome::SleepOnly);
        assert_eq!(report.state, PresenceState::Idle);
        assert!(uplink.calls().is_empty());
        // Early exit on the 70 cm poll at +1 s.
        assert_eq!(clock.now_ms(), 16_000);
        assert_eq!(sensor.reads(), 4);
    }

    #[test]
    fn confirmation_uploads_a_fresh_measurement() {
        let clock = FakeClock::new(15_000);
        let uplink = RecordingUplink::default();
        let sensor = ScriptedSensor::new(&[30.0]);
        // 7 polls across the 3 s window (0, 0.5, ... 3 s), then the fresh reading.
        for _ in 0..7 {
            sensor.push(31.0);
        }
        sensor.push(27.25);
        let mut cycle = WakeCycle::new(&variant_two(), sensor.clone(), uplink.clone(), clock.clone());

        let report = cycle.run_cycle(PresenceState::Detecting { since_ms: 0 });

        assert_eq!(report.outcome, CycleOutcome::UploadAttempted(UploadResult::Uploaded));
        assert_eq!(uplink.uploads(), vec![27.25]);
        assert_eq!(report.state, PresenceState::Idle);
        assert_eq!(clock.now_ms(), 18_000);
        assert_eq!(sensor.reads(), 9);
    }

    #[test]
    fn presence_spans_deep_sleep_cycles_through_retained_state() {
        let settings = variant_one();
        let clock = FakeClock::new(0);
        let uplink = RecordingUplink::default();
        let mut retained = RetainedPresence::EMPTY;
        let mut cause = WakeCause::ColdBoot;

        // Each iteration is a fresh boot: a new controller, state from RTC memory.
        for wake in 0..5u32 {
            let mut cycle = WakeCycle::new(
                &settings,
                ScriptedSensor::new(&[42.0]),
                uplink.clone(),
                clock.clone(),
            );
            let report = cycle.run_cycle(retained.resume(cause));
            retained = RetainedPresence::encode(report.state, wake + 1);

            clock.advance(settings.sleep_duration);
            cause = WakeCause::TimerWake;
        }

        // Woke at 0, 5, 10, 15 s → upload on the fourth wake only.
        assert_eq!(uplink.uploads(), vec![42.0]);
        assert_eq!(retained.wake_count, 5);
        assert_eq!(retained.decode(), PresenceState::Detecting { since_ms: 20_000 });
    }

    #[test]
    fn reset_mid_detection_starts_over() {
        let settings = variant_one();
        let clock = FakeClock::new(0);
        let uplink = RecordingUplink::default();
        let mut retained = RetainedPresence::EMPTY;

        let causes = [
            WakeCause::ColdBoot,
            WakeCause::TimerWake,
            WakeCause::ColdBoot, // brown-out at 10 s
            WakeCause::TimerWake,
            WakeCause::TimerWake,
        ];
        for cause in causes {
            let mut cycle = WakeCycle::new(
                &settings,
                ScriptedSensor::new(&[42.0]),
                uplink.clone(),
                clock.clone(),
            );
            let report = cycle.run_cycle(retained.resume(cause));
            retained = RetainedPresence::encode(report.state, 0);
            clock.advance(settings.sleep_duration);
        }

        assert!(uplink.uploads().is_empty());
        assert_eq!(retained.decode(), PresenceState::Detecting { since_ms: 10_000 });
    }
}
