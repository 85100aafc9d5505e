// Presence Reporter — battery-powered presence-triggered distance telemetry
//
// Wakes from deep sleep, takes one ultrasonic reading, debounces it against
// the presence retained in RTC memory, and only when an object has been
// present long enough joins Wi-Fi and writes the distance to the remote
// store before going back to sleep.
//
// Everything here except the `espidf`-gated pieces builds and tests on the
// host.

pub mod config;
pub mod cycle;
pub mod drivers;
pub mod events;
pub mod power;
pub mod presence;
pub mod settings;
pub mod uplink;
pub mod wait;

#[cfg(test)]
mod scenario_tests;
#[cfg(test)]
mod testing;

pub use cycle::{CycleReport, WakeCycle};
pub use events::{CycleOutcome, Sample, UploadResult};
pub use presence::{Debouncer, PresenceEvent, PresenceState};
pub use settings::{Credentials, Settings};
