// Presence Reporter — Runtime Settings
//
// Defaults come from `config`; on the device, NVS entries in the
// `presence` namespace override individual values.

use std::time::Duration;

use anyhow::{bail, ensure};

use crate::config::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfirmationWindow {
    pub duration: Duration,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub movement_threshold_cm: f32,
    pub sample_interval: Duration,
    pub sleep_duration: Duration,
    pub sustained_threshold: Duration,
    /// `None` uploads as soon as presence is sustained.
    pub confirmation: Option<ConfirmationWindow>,
    /// Keep the CPU up and re-run the cycle every `sample_interval`
    /// instead of deep sleeping (bench / USB-powered use).
    pub stay_awake: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            movement_threshold_cm: MOVEMENT_THRESHOLD_CM,
            sample_interval: Duration::from_millis(MEASURE_INTERVAL_MS),
            sleep_duration: Duration::from_secs(DEEP_SLEEP_DURATION_S),
            sustained_threshold: Duration::from_millis(SUSTAINED_THRESHOLD_MS),
            confirmation: confirmation_window(CONTINUOUS_DETECTION_MS, CONFIRM_POLL_INTERVAL_MS),
            stay_awake: false,
        }
    }
}

fn confirmation_window(duration_ms: u64, poll_ms: u64) -> Option<ConfirmationWindow> {
    (duration_ms > 0).then(|| ConfirmationWindow {
        duration: Duration::from_millis(duration_ms),
        poll_interval: Duration::from_millis(poll_ms),
    })
}

/// Optional values layered over the defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub threshold_mm: Option<u32>,
    pub sample_interval_ms: Option<u32>,
    pub sleep_s: Option<u32>,
    pub sustained_ms: Option<u32>,
    pub confirm_ms: Option<u32>,
    pub confirm_poll_ms: Option<u32>,
    pub stay_awake: Option<bool>,
}

impl Settings {
    pub fn with_overrides(mut self, o: &SettingsOverrides) -> anyhow::Result<Self> {
        if let Some(mm) = o.threshold_mm {
            self.movement_threshold_cm = mm as f32 / 10.0;
        }
        if let Some(ms) = o.sample_interval_ms {
            self.sample_interval = Duration::from_millis(ms as u64);
        }
        if let Some(s) = o.sleep_s {
            self.sleep_duration = Duration::from_secs(s as u64);
        }
        if let Some(ms) = o.sustained_ms {
            self.sustained_threshold = Duration::from_millis(ms as u64);
        }
        if o.confirm_ms.is_some() || o.confirm_poll_ms.is_some() {
            let current_poll = self
                .confirmation
                .map(|c| c.poll_interval.as_millis() as u64)
                .unwrap_or(CONFIRM_POLL_INTERVAL_MS);
            let current_window = self
                .confirmation
                .map(|c| c.duration.as_millis() as u64)
                .unwrap_or(0);
            self.confirmation = confirmation_window(
                o.confirm_ms.map(u64::from).unwrap_or(current_window),
                o.confirm_poll_ms.map(u64::from).unwrap_or(current_poll),
            );
        }
        if let Some(stay) = o.stay_awake {
            self.stay_awake = stay;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.movement_threshold_cm.is_finite() && self.movement_threshold_cm > 0.0,
            "movement threshold must be positive, got {}",
            self.movement_threshold_cm
        );
        ensure!(!self.sample_interval.is_zero(), "sample interval must be non-zero");
        if !self.stay_awake && self.sleep_duration.is_zero() {
            bail!("sleep duration must be non-zero when deep sleeping");
        }
        if let Some(window) = self.confirmation {
            ensure!(
                !window.poll_interval.is_zero(),
                "confirmation poll interval must be non-zero"
            );
            ensure!(
                window.poll_interval <= window.duration,
                "confirmation poll interval ({:?}) exceeds window ({:?})",
                window.poll_interval,
                window.duration
            );
        }
        Ok(())
    }

    /// How long to be gone between cycles.
    pub fn cycle_pause(&self) -> Duration {
        if self.stay_awake {
            self.sample_interval
        } else {
            self.sleep_duration
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub network_ssid: String,
    pub network_password: String,
    pub store_url: String,
    pub store_auth_token: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            network_ssid: WIFI_SSID.into(),
            network_password: WIFI_PASSWORD.into(),
            store_url: STORE_URL.into(),
            store_auth_token: STORE_AUTH_TOKEN.into(),
        }
    }
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.network_ssid.is_empty() && !self.store_url.is_empty()
    }
}

// Secrets stay out of the serial log.
impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("network_ssid", &self.network_ssid)
            .field("store_url", &self.store_url)
            .finish_non_exhaustive()
    }
}

#[cfg(target_os = "espidf")]
pub use self::nvs::load;

#[cfg(target_os = "espidf")]
mod nvs {
    use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

    use super::{Credentials, Settings, SettingsOverrides};
    use crate::config::NVS_NAMESPACE;

    fn read_overrides(nvs: &EspNvs<NvsDefault>) -> anyhow::Result<SettingsOverrides> {
        Ok(SettingsOverrides {
            threshold_mm: nvs.get_u32("thresh_mm")?,
            sample_interval_ms: nvs.get_u32("sample_ms")?,
            sleep_s: nvs.get_u32("sleep_s")?,
            sustained_ms: nvs.get_u32("sustain_ms")?,
            confirm_ms: nvs.get_u32("confirm_ms")?,
            confirm_poll_ms: nvs.get_u32("poll_ms")?,
            stay_awake: nvs.get_u8("stay_awake")?.map(|v| v != 0),
        })
    }

    fn read_str(nvs: &EspNvs<NvsDefault>, key: &str, into: &mut String) {
        let mut buf = [0u8; 128];
        match nvs.get_str(key, &mut buf) {
            Ok(Some(value)) if !value.is_empty() => *into = value.to_owned(),
            Ok(_) => {}
            Err(e) => log::warn!("NVS read of '{}' failed: {}", key, e),
        }
    }

    /// Settings and credentials with NVS overrides applied.  Never fails:
    /// anything unreadable or invalid falls back to the built-in defaults.
    pub fn load(partition: &EspDefaultNvsPartition) -> (Settings, Credentials) {
        let mut credentials = Credentials::default();

        let nvs = match EspNvs::new(partition.clone(), NVS_NAMESPACE, false) {
            Ok(nvs) => nvs,
            Err(e) => {
                log::info!("No '{}' NVS namespace ({}), using defaults", NVS_NAMESPACE, e);
                return (Settings::default(), credentials);
            }
        };

        let settings = match read_overrides(&nvs)
            .and_then(|o| Settings::default().with_overrides(&o))
        {
            Ok(s) => s,
            Err(e) => {
                log::error!("Invalid settings in NVS ({}), using defaults", e);
                Settings::default()
            }
        };

        read_str(&nvs, "ssid", &mut credentials.network_ssid);
        read_str(&nvs, "pass", &mut credentials.network_password);
        read_str(&nvs, "url", &mut credentials.store_url);
        read_str(&nvs, "token", &mut credentials.store_auth_token);

        (settings, credentials)
    }
}
