// Presence Reporter — Wi-Fi station uplink
//
// The radio is only started for an upload and stopped right after, so the
// idle current between wake cycles stays minimal.

use std::time::Duration;

use anyhow::anyhow;
use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::wifi::EspWifi;

use super::firebase::{self, RealtimeDb};
use super::Uplink;
use crate::config::*;
use crate::settings::Credentials;
use crate::wait::{await_condition, Clock, SystemClock, WaitOutcome};

pub struct WifiUplink<'d> {
    wifi: EspWifi<'d>,
    credentials: Credentials,
    db: RealtimeDb,
}

impl<'d> WifiUplink<'d> {
    pub fn new(wifi: EspWifi<'d>, credentials: Credentials) -> Self {
        let db = RealtimeDb::new(&credentials.store_url, &credentials.store_auth_token);
        Self {
            wifi,
            credentials,
            db,
        }
    }

    fn client_configuration(&self) -> anyhow::Result<Configuration> {
        let auth_method = if self.credentials.network_password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        Ok(Configuration::Client(ClientConfiguration {
            ssid: self
                .credentials
                .network_ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("SSID too long"))?,
            password: self
                .credentials
                .network_password
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("WiFi password too long"))?,
            auth_method,
            ..Default::default()
        }))
    }
}

impl Uplink for WifiUplink<'_> {
    fn connect(&mut self) -> anyhow::Result<()> {
        if self.wifi.is_up().unwrap_or(false) {
            return Ok(());
        }
        log::info!("Connecting to WiFi '{}'…", self.credentials.network_ssid);

        let config = self.client_configuration()?;
        self.wifi.set_configuration(&config)?;
        self.wifi.start()?;
        self.wifi.connect()?;

        let wifi = &self.wifi;
        let outcome = await_condition(
            &SystemClock,
            || wifi.is_up().unwrap_or(false),
            Duration::from_millis(WIFI_POLL_INTERVAL_MS),
            Duration::from_millis(WIFI_CONNECT_TIMEOUT_MS),
        );

        match outcome {
            WaitOutcome::Satisfied => {
                log::info!("WiFi connected");
                Ok(())
            }
            WaitOutcome::TimedOut => Err(anyhow!(
                "no association within {} ms",
                WIFI_CONNECT_TIMEOUT_MS
            )),
        }
    }

    fn upload_value(&mut self, path: &str, value: f32) -> anyhow::Result<()> {
        let started = SystemClock.now_ms();
        firebase::put_value(&self.db, path, value)?;
        log::info!(
            "Wrote {:.2} to {} in {} ms",
            value,
            path,
            SystemClock.now_ms().saturating_sub(started)
        );
        Ok(())
    }

    fn disconnect(&mut self) {
        log::info!("Forcing WiFi shutdown…");
        if let Err(e) = self.wifi.disconnect() {
            log::debug!("WiFi disconnect: {}", e);
        }
        if let Err(e) = self.wifi.stop() {
            log::warn!("WiFi stop failed: {}", e);
        }
    }
}
