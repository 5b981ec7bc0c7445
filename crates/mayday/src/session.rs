//! Session and identity gateway.
//!
//! Wraps the managed identity provider behind [`IdentityGateway`] and
//! models the process-wide session state as an explicit, subscribable
//! [`SessionContext`] rather than a bare mutable singleton. The CLI
//! persists the signed-in user between invocations via [`SessionFile`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::error::{Error, Result};

/// Minimum password length accepted before calling the provider.
pub const MIN_PASSWORD_LEN: usize = 6;

/// The minimal projection of an identity-provider account.
///
/// Created and destroyed entirely by the provider; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque provider-assigned identifier.
    pub uid: String,
    /// Account email, if the provider exposes one.
    pub email: Option<String>,
    /// Display name, if set.
    pub display_name: Option<String>,
}

/// Gateway over the managed identity provider.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Create a new identity and return its projection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Identity`] wrapping the provider diagnostic
    /// (invalid email, weak or duplicate password, outage).
    async fn sign_up(&self, email: &str, password: &str) -> Result<User>;

    /// Authenticate an existing identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Identity`] for wrong credentials, a disabled
    /// account, or a provider outage.
    async fn sign_in(&self, email: &str, password: &str) -> Result<User>;

    /// Clear the active provider session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Identity`] only on a provider outage.
    async fn sign_out(&self) -> Result<()>;
}

/// Reject malformed credentials before any provider call.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for an empty or `@`-less email, or a
/// password shorter than [`MIN_PASSWORD_LEN`] characters.
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.is_empty() || !email.contains('@') {
        return Err(Error::invalid_argument("a valid email address is required"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::invalid_argument(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Process-wide session state with push-based change notification.
///
/// Cloning the context shares the same underlying state. Subscribers are
/// invoked once immediately with the current state and again on every
/// subsequent sign-in or sign-out.
#[derive(Debug, Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<Option<User>>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Create a context with no active session.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// The currently signed-in user, if any.
    #[must_use]
    pub fn current(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    /// Check whether a user is signed in.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Replace the session state and notify subscribers.
    pub fn set(&self, user: Option<User>) {
        debug!(signed_in = user.is_some(), "session state changed");
        // send_replace never fails even with zero receivers alive.
        self.tx.send_replace(user);
    }

    /// Register a session-change callback.
    ///
    /// The callback fires once immediately with the current state, then on
    /// every change, until the returned handle is dropped or
    /// [`SessionSubscription::unsubscribe`] is called. Requires a running
    /// tokio runtime.
    pub fn subscribe<F>(&self, mut callback: F) -> SessionSubscription
    where
        F: FnMut(Option<User>) + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        let task = tokio::spawn(async move {
            let current = rx.borrow_and_update().clone();
            callback(current);
            while rx.changed().await.is_ok() {
                let current = rx.borrow_and_update().clone();
                callback(current);
            }
        });
        SessionSubscription { task }
    }
}

/// Cancellation handle for a session-change subscription.
///
/// Dropping the handle tears the subscription down; `unsubscribe` does so
/// explicitly.
#[derive(Debug)]
pub struct SessionSubscription {
    task: tokio::task::JoinHandle<()>,
}

impl SessionSubscription {
    /// Stop delivering session changes to this subscriber.
    pub fn unsubscribe(self) {
        // Drop runs the abort.
    }

    /// Check whether the subscription is still delivering changes.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The session record persisted between CLI invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// The signed-in user.
    pub user: User,
    /// When the session was established.
    pub signed_in_at: DateTime<Utc>,
}

impl StoredSession {
    /// Record a session established now.
    #[must_use]
    pub fn now(user: User) -> Self {
        Self {
            user,
            signed_in_at: Utc::now(),
        }
    }
}

/// On-disk persistence for the CLI session.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Use the given path for the session record.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this file lives at.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<StoredSession>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist the session record, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories or file cannot be written.
    pub fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Remove the stored session. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
