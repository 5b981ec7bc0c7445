//! Error types for mayday.
//!
//! This module defines all error types used throughout the mayday crate,
//! providing detailed context for debugging and user-friendly error messages.

use thiserror::Error;

use crate::contact::MAX_CONTACTS;
use crate::locate::LocateError;

/// The main error type for mayday operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Caller Input Errors ===
    /// Missing or malformed caller input, rejected before any external call.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected input.
        message: String,
    },

    /// The user already owns the maximum number of emergency contacts.
    #[error("maximum of {limit} emergency contacts allowed")]
    LimitExceeded {
        /// The contact cap that was hit.
        limit: usize,
    },

    /// The addressed contact does not exist in the store.
    #[error("contact '{contact_id}' not found")]
    NotFound {
        /// Identifier of the missing contact.
        contact_id: String,
    },

    /// An SOS trigger precondition was not met.
    #[error("precondition failed: {message}")]
    PreconditionFailed {
        /// Which precondition failed.
        message: String,
    },

    // === Gateway Errors ===
    /// The identity provider rejected an operation or was unreachable.
    #[error("identity provider error: {message}")]
    Identity {
        /// The provider's diagnostic.
        message: String,
    },

    /// A read or write against the document store failed.
    #[error("store {operation} failed: {message}")]
    Store {
        /// The store operation that failed.
        operation: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// A fresh geolocation fix could not be acquired.
    #[error(transparent)]
    Location(#[from] LocateError),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for mayday operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create the contact-cap error.
    #[must_use]
    pub fn limit_exceeded() -> Self {
        Self::LimitExceeded {
            limit: MAX_CONTACTS,
        }
    }

    /// Create a contact-not-found error.
    #[must_use]
    pub fn not_found(contact_id: impl Into<String>) -> Self {
        Self::NotFound {
            contact_id: contact_id.into(),
        }
    }

    /// Create a precondition failure.
    #[must_use]
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            message: message.into(),
        }
    }

    /// Create an identity provider error.
    #[must_use]
    pub fn identity(message: impl Into<String>) -> Self {
        Self::Identity {
            message: message.into(),
        }
    }

    /// Create a document store error for the given operation.
    #[must_use]
    pub fn store(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Store {
            operation,
            message: message.into(),
        }
    }

    /// Check if this error is the contact cap.
    #[must_use]
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::LimitExceeded { .. })
    }

    /// Check if this error is a missing contact.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a failed SOS precondition.
    #[must_use]
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }

    /// The transient notice shown to the user for this error.
    ///
    /// Identity diagnostics are deliberately collapsed into a generic
    /// message; the provider's reason stays in the logs only.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidArgument { message } | Self::PreconditionFailed { message } => {
                message.clone()
            }
            Self::LimitExceeded { limit } => {
                format!("You can only add up to {limit} emergency contacts.")
            }
            Self::NotFound { .. } => "That contact no longer exists.".to_string(),
            Self::Identity { .. } => {
                "Could not complete the sign-in request. Please try again.".to_string()
            }
            Self::Store { operation, .. } => match *operation {
                "list" => "Could not load your contacts. Please try again.".to_string(),
                _ => "Could not save your contacts. Please try again.".to_string(),
            },
            Self::Location(err) => err.user_message().to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}
