// Presence Reporter — Wake Cycle Controller
//
// One invocation per wake:  measure → debounce → (confirm) → upload → report.
// Sleeping is left to the caller so the cycle itself always returns.

use crate::config::UPLOAD_PATH;
use crate::drivers::DistanceSensor;
use crate::events::{CycleOutcome, Sample, UploadResult};
use crate::presence::{Debouncer, PresenceEvent, PresenceState};
use crate::settings::{ConfirmationWindow, Settings};
use crate::uplink::Uplink;
use crate::wait::{await_condition, Clock, WaitOutcome};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// State to carry into the next cycle.
    pub state: PresenceState,
    pub outcome: CycleOutcome,
    /// The sample that drove the debounce step.
    pub sample: Sample,
}

pub struct WakeCycle<S, U, C> {
    sensor: S,
    uplink: U,
    clock: C,
    debouncer: Debouncer,
    confirmation: Option<ConfirmationWindow>,
}

impl<S, U, C> WakeCycle<S, U, C>
where
    S: DistanceSensor,
    U: Uplink,
    C: Clock,
{
    pub fn new(settings: &Settings, sensor: S, uplink: U, clock: C) -> Self {
        Self {
            sensor,
            uplink,
            clock,
            debouncer: Debouncer::new(
                settings.movement_threshold_cm,
                settings.sustained_threshold.as_millis() as u64,
            ),
            confirmation: settings.confirmation,
        }
    }

    pub fn run_cycle(&mut self, state: PresenceState) -> CycleReport {
        let sample = self.sensor.measure();
        let now = self.clock.now_ms();
        let (state, event) = self.debouncer.step(state, &sample, now);

        let outcome = match event {
            None => CycleOutcome::SleepOnly,
            Some(PresenceEvent::Sustained) => {
                let value = match self.confirmation {
                    None => Some(sample.distance_cm),
                    Some(window) => self.confirm(window),
                };
                match value {
                    Some(distance) => CycleOutcome::UploadAttempted(self.upload(distance)),
                    None => CycleOutcome::SleepOnly,
                }
            }
        };

        // Every sustained detection is consumed, uploaded or not.
        let state = match event {
            Some(_) => PresenceState::Idle,
            None => state,
        };

        log::info!("Cycle done: {} (next state {:?})", outcome, state);
        CycleReport {
            state,
            outcome,
            sample,
        }
    }

    /// Hold-to-confirm: the object must stay in range for the whole window.
    /// Returns a fresh distance to upload, or `None` if it left.
    fn confirm(&mut self, window: ConfirmationWindow) -> Option<f32> {
        log::info!(
            "Confirming presence for {} ms (poll every {} ms)",
            window.duration.as_millis(),
            window.poll_interval.as_millis()
        );

        let threshold = self.debouncer.threshold_cm();
        let sensor = &mut self.sensor;
        let left = await_condition(
            &self.clock,
            || !sensor.measure().qualifies(threshold),
            window.poll_interval,
            window.duration,
        );

        if left == WaitOutcome::Satisfied {
            log::info!("Object left during confirmation, no upload");
            return None;
        }

        let fresh = self.sensor.measure();
        if !fresh.valid {
            log::warn!("Confirmation re-measure got no echo, skipping upload");
            return None;
        }
        log::info!("Presence confirmed at {:.2} cm", fresh.distance_cm);
        Some(fresh.distance_cm)
    }

    fn upload(&mut self, distance_cm: f32) -> UploadResult {
        let result = match self.uplink.connect() {
            Err(e) => {
                log::warn!("WiFi connection failed: {:#}", e);
                UploadResult::AssociationFailed
            }
            Ok(()) => match self.uplink.upload_value(UPLOAD_PATH, distance_cm) {
                Ok(()) => {
                    log::info!("Upload success.");
                    UploadResult::Uploaded
                }
                Err(e) => {
                    log::warn!("Upload failed: {:#}", e);
                    UploadResult::UploadFailed
                }
            },
        };
        self.uplink.disconnect();
        result
    }
}
