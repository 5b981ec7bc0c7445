//! HTTP AI enhancement backend.
//!
//! Posts the position and distress text to the enhancement endpoint. A
//! response missing either required field is an enhancement failure; the
//! composer degrades to the default message either way.

use async_trait::async_trait;
use serde::Deserialize;

use mayday::config::EnhanceConfig;
use mayday::enhance::{EnhanceError, EnhanceRequest, EnhanceResponse, Enhancer};

/// [`Enhancer`] backed by the hosted enhancement endpoint.
#[derive(Debug, Clone)]
pub struct HttpEnhancer {
    client: reqwest::Client,
    endpoint: String,
}

/// Loose wire form: fields validated for presence after parsing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    enhanced_message: Option<String>,
    suggested_numbers: Option<Vec<String>>,
}

fn check_required(wire: WireResponse) -> Result<EnhanceResponse, EnhanceError> {
    let enhanced_message = wire
        .enhanced_message
        .ok_or_else(|| EnhanceError::Malformed("response is missing enhancedMessage".to_string()))?;
    let suggested_numbers = wire.suggested_numbers.ok_or_else(|| {
        EnhanceError::Malformed("response is missing suggestedNumbers".to_string())
    })?;
    Ok(EnhanceResponse {
        enhanced_message,
        suggested_numbers,
    })
}

impl HttpEnhancer {
    /// Create an enhancer over the configured endpoint.
    #[must_use]
    pub fn new(config: &EnhanceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl Enhancer for HttpEnhancer {
    async fn enhance(
        &self,
        request: EnhanceRequest,
    ) -> std::result::Result<EnhanceResponse, EnhanceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| EnhanceError::Transport(format!("endpoint unreachable: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnhanceError::Transport(format!(
                "endpoint returned {status}"
            )));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|err| EnhanceError::Malformed(err.to_string()))?;
        check_required(wire)
    }
}
