//! Best-effort AI message enhancement.
//!
//! The enhancement step rewrites the distress message and suggests
//! emergency-service numbers. Its failure is non-fatal by design: the
//! outcome is an explicit [`Enhancement`] value the composer matches on,
//! never an error that aborts the SOS flow.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Input sent to the enhancement endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceRequest {
    /// Latitude of the fresh fix.
    pub latitude: f64,
    /// Longitude of the fresh fix.
    pub longitude: f64,
    /// The distress message to enhance.
    pub distress_message: String,
}

/// A well-formed response from the enhancement endpoint.
///
/// Both fields are required; a response missing either one is treated as
/// an enhancement failure by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceResponse {
    /// The rewritten distress message.
    pub enhanced_message: String,
    /// Emergency-service numbers the model suggested.
    pub suggested_numbers: Vec<String>,
}

/// Why an enhancement attempt failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnhanceError {
    /// The endpoint could not be reached or returned a failure status.
    #[error("enhancement request failed: {0}")]
    Transport(String),

    /// The response body did not carry both required fields.
    #[error("malformed enhancement response: {0}")]
    Malformed(String),
}

/// A text-enhancement backend.
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Enhance the distress message for the given position.
    ///
    /// # Errors
    ///
    /// Returns an [`EnhanceError`]; callers treat any failure as a
    /// degraded (default-message) outcome, never as a fatal one.
    async fn enhance(
        &self,
        request: EnhanceRequest,
    ) -> std::result::Result<EnhanceResponse, EnhanceError>;
}

/// The outcome of the enhancement step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enhancement {
    /// The endpoint returned a usable rewrite.
    Applied {
        /// The rewritten message.
        message: String,
        /// Suggested emergency-service numbers, possibly empty.
        suggested_numbers: Vec<String>,
    },
    /// Enhancement failed; the default message is used instead.
    Degraded {
        /// Why the enhancement was skipped.
        reason: String,
    },
}

impl Enhancement {
    /// A degraded outcome with the given reason.
    #[must_use]
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::Degraded {
            reason: reason.into(),
        }
    }

    /// Check whether this outcome fell back to the default message.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Run the enhancement step with a bounded wait.
///
/// Any failure (transport, malformed response, empty rewrite, or the wait
/// elapsing) is logged and collapsed into [`Enhancement::Degraded`]. The
/// pending request is abandoned on timeout, not retried.
pub async fn run_enhancement(
    enhancer: &dyn Enhancer,
    request: EnhanceRequest,
    wait: Duration,
) -> Enhancement {
    match tokio::time::timeout(wait, enhancer.enhance(request)).await {
        Ok(Ok(response)) => {
            if response.enhanced_message.trim().is_empty() {
                warn!("enhancement returned an empty message, using default");
                return Enhancement::degraded("enhancement returned an empty message");
            }
            Enhancement::Applied {
                message: response.enhanced_message,
                suggested_numbers: response.suggested_numbers,
            }
        }
        Ok(Err(err)) => {
            warn!(error = %err, "enhancement failed, using default message");
            Enhancement::degraded(err.to_string())
        }
        Err(_) => {
            warn!(wait_secs = wait.as_secs(), "enhancement timed out, using default message");
            Enhancement::degraded(format!("enhancement timed out after {}s", wait.as_secs()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedEnhancer(std::result::Result<EnhanceResponse, EnhanceError>);

    #[async_trait]
    impl Enhancer for ScriptedEnhancer {
        async fn enhance(
            &self,
            _request: EnhanceRequest,
        ) -> std::result::Result<EnhanceResponse, EnhanceError> {
            self.0.clone()
        }
    }

    struct StalledEnhancer;

    #[async_trait]
    impl Enhancer for StalledEnhancer {
        async fn enhance(
            &self,
            _request: EnhanceRequest,
        ) -> std::result::Result<EnhanceResponse, EnhanceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(EnhanceError::Transport("unreachable".to_string()))
        }
    }

    fn request() -> EnhanceRequest {
        EnhanceRequest {
            latitude: 1.0,
            longitude: 2.0,
            distress_message: "help".to_string(),
        }
    }

    #[test]
    fn test_request_wire_names() {
        let json = serde_json::to_string(&request()).unwrap();
        assert!(json.contains("distressMessage"));
        assert!(json.contains("latitude"));
    }

    #[test]
    fn test_response_requires_both_fields() {
        let full = r#"{"enhancedMessage": "m", "suggestedNumbers": ["911"]}"#;
        assert!(serde_json::from_str::<EnhanceResponse>(full).is_ok());

        let missing_numbers = r#"{"enhancedMessage": "m"}"#;
        assert!(serde_json::from_str::<EnhanceResponse>(missing_numbers).is_err());

        let missing_message = r#"{"suggestedNumbers": []}"#;
        assert!(serde_json::from_str::<EnhanceResponse>(missing_message).is_err());
    }

    #[tokio::test]
    async fn test_run_enhancement_applies_response() {
        let enhancer = ScriptedEnhancer(Ok(EnhanceResponse {
            enhanced_message: "Refined SOS".to_string(),
            suggested_numbers: vec!["911".to_string()],
        }));

        let outcome = run_enhancement(&enhancer, request(), Duration::from_secs(10)).await;
        assert_eq!(
            outcome,
            Enhancement::Applied {
                message: "Refined SOS".to_string(),
                suggested_numbers: vec!["911".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_run_enhancement_degrades_on_error() {
        let enhancer = ScriptedEnhancer(Err(EnhanceError::Transport("dns failure".to_string())));

        let outcome = run_enhancement(&enhancer, request(), Duration::from_secs(10)).await;
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_run_enhancement_degrades_on_empty_message() {
        let enhancer = ScriptedEnhancer(Ok(EnhanceResponse {
            enhanced_message: "   ".to_string(),
            suggested_numbers: Vec::new(),
        }));

        let outcome = run_enhancement(&enhancer, request(), Duration::from_secs(10)).await;
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_run_enhancement_degrades_on_timeout() {
        let outcome =
            run_enhancement(&StalledEnhancer, request(), Duration::from_millis(20)).await;
        match outcome {
            Enhancement::Degraded { reason } => assert!(reason.contains("timed out")),
            Enhancement::Applied { .. } => panic!("timeout must degrade"),
        }
    }
}
