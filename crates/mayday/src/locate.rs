//! Geolocation acquisition.
//!
//! The SOS flow needs one fresh, high-accuracy position fix per trigger;
//! a cached fix is never reused. [`Locator`] is the seam a device source
//! implements, and [`acquire_fix`] adds the bounded wait around it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single position fix, captured at trigger time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// When this fix was captured.
    pub captured_at: DateTime<Utc>,
}

impl GeoFix {
    /// Create a fix captured now.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            captured_at: Utc::now(),
        }
    }

    /// The shareable map link for this fix.
    #[must_use]
    pub fn map_link(&self) -> String {
        format!(
            "https://maps.google.com/?q={},{}",
            self.latitude, self.longitude
        )
    }
}

/// Why a position fix could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocateErrorKind {
    /// The user or platform denied location access.
    PermissionDenied,
    /// The position could not be determined.
    PositionUnavailable,
    /// No fix arrived within the bounded wait.
    Timeout,
}

impl std::fmt::Display for LocateErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::PositionUnavailable => write!(f, "position unavailable"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// A failed attempt to acquire a fresh fix. Always aborts the SOS flow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("location unavailable ({kind}): {message}")]
pub struct LocateError {
    /// Which failure mode occurred.
    pub kind: LocateErrorKind,
    /// Diagnostic detail from the source.
    pub message: String,
}

impl LocateError {
    /// Location access was denied.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self {
            kind: LocateErrorKind::PermissionDenied,
            message: message.into(),
        }
    }

    /// The position could not be determined.
    #[must_use]
    pub fn position_unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: LocateErrorKind::PositionUnavailable,
            message: message.into(),
        }
    }

    /// The bounded wait elapsed without a fix.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: LocateErrorKind::Timeout,
            message: message.into(),
        }
    }

    /// The user-facing notice for this failure mode.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self.kind {
            LocateErrorKind::PermissionDenied => {
                "Location access denied. Please enable location services."
            }
            LocateErrorKind::PositionUnavailable => {
                "Location unavailable. Please check your connection or signal."
            }
            LocateErrorKind::Timeout => "Location request timed out. Please try again.",
        }
    }
}

/// A source of fresh position fixes.
#[async_trait]
pub trait Locator: Send + Sync {
    /// Acquire one fresh, high-accuracy fix.
    ///
    /// Implementations must not serve a cached position.
    ///
    /// # Errors
    ///
    /// Returns a [`LocateError`] describing why no fix was produced.
    async fn locate(&self) -> std::result::Result<GeoFix, LocateError>;
}

/// Acquire a fix with a bounded wait.
///
/// The pending request is abandoned, not retried, when `wait` elapses.
///
/// # Errors
///
/// Returns the locator's error, or a [`LocateErrorKind::Timeout`] error if
/// no fix arrived in time.
pub async fn acquire_fix(
    locator: &dyn Locator,
    wait: Duration,
) -> std::result::Result<GeoFix, LocateError> {
    match tokio::time::timeout(wait, locator.locate()).await {
        Ok(result) => result,
        Err(_) => Err(LocateError::timeout(format!(
            "no position fix within {}s",
            wait.as_secs()
        ))),
    }
}
