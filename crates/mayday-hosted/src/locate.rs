//! HTTP device-location source.
//!
//! Queries the local device agent for a fresh fix on every call; nothing
//! is cached here, so each SOS trigger observes a new position reading.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use mayday::config::LocateConfig;
use mayday::locate::{GeoFix, LocateError, Locator};

/// [`Locator`] backed by the device agent's fix endpoint.
#[derive(Debug, Clone)]
pub struct HttpLocator {
    client: reqwest::Client,
    endpoint: String,
}

/// A position reading on the wire.
#[derive(Debug, Deserialize)]
struct FixResponse {
    latitude: f64,
    longitude: f64,
}

fn error_for_status(status: StatusCode) -> LocateError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        LocateError::permission_denied(format!("location source refused: {status}"))
    } else {
        LocateError::position_unavailable(format!("location source failed: {status}"))
    }
}

impl HttpLocator {
    /// Create a locator over the configured device agent.
    #[must_use]
    pub fn new(config: &LocateConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl Locator for HttpLocator {
    async fn locate(&self) -> std::result::Result<GeoFix, LocateError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|err| {
                LocateError::position_unavailable(format!("location source unreachable: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_for_status(status));
        }

        let fix: FixResponse = response.json().await.map_err(|err| {
            LocateError::position_unavailable(format!("malformed position reading: {err}"))
        })?;
        Ok(GeoFix::new(fix.latitude, fix.longitude))
    }
}
