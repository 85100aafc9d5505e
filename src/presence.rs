// Presence Reporter — Presence Debouncer
//
// Turns a stream of distance samples into a single "sustained presence"
// event.  The state is an owned value threaded through `step` so it can be
// parked in RTC memory between deep-sleep cycles.

use crate::events::Sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenceState {
    #[default]
    Idle,
    /// Object within range since `since_ms`, not yet long enough.
    Detecting { since_ms: u64 },
    /// The sustained event has fired for this detection run.
    Sustained { since_ms: u64 },
}

impl PresenceState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    Sustained,
}

#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    threshold_cm: f32,
    sustained_ms: u64,
}

impl Debouncer {
    pub fn new(threshold_cm: f32, sustained_ms: u64) -> Self {
        Self {
            threshold_cm,
            sustained_ms,
        }
    }

    pub fn threshold_cm(&self) -> f32 {
        self.threshold_cm
    }

    /// Advance the state machine by one sample taken at `now_ms`.
    pub fn step(
        &self,
        state: PresenceState,
        sample: &Sample,
        now_ms: u64,
    ) -> (PresenceState, Option<PresenceEvent>) {
        if !sample.qualifies(self.threshold_cm) {
            if !state.is_idle() {
                log::info!("Object moved away, resetting timer");
            }
            return (PresenceState::Idle, None);
        }

        match state {
            PresenceState::Idle => {
                log::info!("Object detected at {:.2} cm, starting timer", sample.distance_cm);
                self.check_sustained(now_ms, now_ms)
            }
            PresenceState::Detecting { since_ms } => self.check_sustained(since_ms, now_ms),
            sustained @ PresenceState::Sustained { .. } => (sustained, None),
        }
    }

    fn check_sustained(&self, since_ms: u64, now_ms: u64) -> (PresenceState, Option<PresenceEvent>) {
        // A clock that stepped backwards counts as no time elapsed.
        let held_ms = now_ms.saturating_sub(since_ms);
        if held_ms >= self.sustained_ms {
            log::info!("Object present for {} ms, sustained", held_ms);
            (PresenceState::Sustained { since_ms }, Some(PresenceEvent::Sustained))
        } else {
            log::debug!("Object present for {} ms of {} ms", held_ms, self.sustained_ms);
            (PresenceState::Detecting { since_ms }, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> Debouncer {
        Debouncer::new(50.0, 15_000)
    }

    /// Feed `(t_ms, cm)` pairs and collect the events.
    fn run(samples: &[(u64, f32)]) -> (PresenceState, Vec<(u64, PresenceEvent)>) {
        let d = debouncer();
        let mut state = PresenceState::Idle;
        let mut events = Vec::new();
        for &(t, cm) in samples {
            let (next, event) = d.step(state, &Sample::from_cm(cm), t);
            state = next;
            if let Some(e) = event {
                events.push((t, e));
            }
        }
        (state, events)
    }

    #[test]
    fn first_qualifying_sample_starts_detecting() {
        let (state, events) = run(&[(1000, 40.0)]);
        assert_eq!(state, PresenceState::Detecting { since_ms: 1000 });
        assert!(events.is_empty());
    }

    #[test]
    fn single_blip_never_sustains() {
        let (state, events) = run(&[(0, 40.0), (1000, 80.0), (20_000, 80.0)]);
        assert_eq!(state, PresenceState::Idle);
        assert!(events.is_empty());
    }

    #[test]
    fn invalid_sample_resets() {
        let (state, _) = run(&[(0, 40.0), (1000, 0.0)]);
        assert_eq!(state, PresenceState::Idle);
    }

    #[test]
    fn held_presence_fires_once() {
        let samples: Vec<(u64, f32)> = (0..=30).map(|s| (s * 1000, 40.0)).collect();
        let (state, events) = run(&samples);
        assert_eq!(events, vec![(15_000, PresenceEvent::Sustained)]);
        assert_eq!(state, PresenceState::Sustained { since_ms: 0 });
    }

    #[test]
    fn refires_only_after_returning_to_idle() {
        let mut samples: Vec<(u64, f32)> = (0..=15).map(|s| (s * 1000, 40.0)).collect();
        samples.push((16_000, 90.0));
        samples.extend((17..=32).map(|s| (s * 1000, 30.0)));
        let (_, events) = run(&samples);
        assert_eq!(
            events,
            vec![(15_000, PresenceEvent::Sustained), (32_000, PresenceEvent::Sustained)]
        );
    }

    #[test]
    fn clock_going_backwards_does_not_fire() {
        let d = debouncer();
        let state = PresenceState::Detecting { since_ms: 50_000 };
        let (next, event) = d.step(state, &Sample::from_cm(20.0), 1_000);
        assert_eq!(next, state);
        assert_eq!(event, None);
    }

    #[test]
    fn zero_sustain_fires_on_first_sample() {
        let d = Debouncer::new(50.0, 0);
        let (state, event) = d.step(PresenceState::Idle, &Sample::from_cm(10.0), 7);
        assert_eq!(state, PresenceState::Sustained { since_ms: 7 });
        assert_eq!(event, Some(PresenceEvent::Sustained));
    }
}
