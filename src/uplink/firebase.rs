// Presence Reporter — Realtime Database REST client
//
// Writes go through the REST API: `PUT <db>/<path>.json?auth=<secret>` with
// the JSON-encoded value as body.  Last write wins.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeDb {
    base_url: String,
    auth_token: String,
}

impl RealtimeDb {
    pub fn new(base_url: &str, auth_token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth_token: auth_token.to_owned(),
        }
    }

    /// Full REST URL for `path` (leading/trailing slashes are tolerated).
    pub fn endpoint(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if self.auth_token.is_empty() {
            format!("{}/{}.json", self.base_url, path)
        } else {
            format!("{}/{}.json?auth={}", self.base_url, path, self.auth_token)
        }
    }

    pub fn body<T: Serialize>(value: &T) -> anyhow::Result<String> {
        Ok(serde_json::to_string(value)?)
    }
}

/// Treat any 2xx as a committed write.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(target_os = "espidf")]
pub use self::esp::put_value;

#[cfg(target_os = "espidf")]
mod esp {
    use std::time::Duration;

    use anyhow::bail;
    use embedded_svc::http::client::Client;
    use embedded_svc::io::Write;
    use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};

    use super::{is_success, RealtimeDb};
    use crate::config::HTTP_TIMEOUT_MS;

    /// One HTTPS `PUT`.  The connection is opened and dropped per call.
    pub fn put_value(db: &RealtimeDb, path: &str, value: f32) -> anyhow::Result<()> {
        let url = db.endpoint(path);
        let body = RealtimeDb::body(&value)?;

        let connection = EspHttpConnection::new(&HttpConfiguration {
            timeout: Some(Duration::from_millis(HTTP_TIMEOUT_MS)),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })?;
        let mut client = Client::wrap(connection);

        let content_length = body.len().to_string();
        let headers = [
            ("content-type", "application/json"),
            ("content-length", content_length.as_str()),
        ];

        let mut request = client.put(&url, &headers)?;
        request.write_all(body.as_bytes())?;
        request.flush()?;
        let response = request.submit()?;

        let status = response.status();
        if !is_success(status) {
            bail!("remote store answered HTTP {}", status);
        }
        log::debug!("PUT {} -> {}", path, status);
        Ok(())
    }
}
