//! Contact store gateway.
//!
//! This module defines the [`ContactStore`] trait that every backend must
//! fulfill, plus the scoping and ordering rules shared by all of them. The
//! hosted document-store backend lives in the `mayday-hosted` crate; an
//! in-memory backend for tests and dry runs lives in [`memory`].

pub mod memory;

use async_trait::async_trait;

use crate::contact::{ContactPatch, EmergencyContact, NewContact, MAX_CONTACTS};
use crate::error::{Error, Result};

/// Gateway over a user's emergency-contact collection.
///
/// Every operation is scoped to one user; a backend must never let one
/// user's calls read or write another user's contacts. The 6-contact cap
/// is re-counted from the store at write time, not from any client-side
/// cached count.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// List the user's contacts, sorted by name and capped at
    /// [`MAX_CONTACTS`] entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty user id, or
    /// [`Error::Store`] if the read fails.
    async fn list(&self, user_id: &str) -> Result<Vec<EmergencyContact>>;

    /// Persist a new contact and return it with its store-assigned id and
    /// creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LimitExceeded`] if the user already owns
    /// [`MAX_CONTACTS`] contacts, [`Error::InvalidArgument`] for malformed
    /// input, or [`Error::Store`] if the write fails.
    async fn create(&self, user_id: &str, contact: NewContact) -> Result<EmergencyContact>;

    /// Merge the given fields onto an existing contact and stamp its
    /// update timestamp. Untouched fields survive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] only when the backing store reports the
    /// document as missing, or [`Error::Store`] if the write fails.
    async fn update(
        &self,
        user_id: &str,
        contact_id: &str,
        patch: ContactPatch,
    ) -> Result<EmergencyContact>;

    /// Remove a contact. Idempotent: deleting an absent id is a success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the delete fails for any reason other
    /// than the document already being gone.
    async fn delete(&self, user_id: &str, contact_id: &str) -> Result<()>;
}

/// Reject an empty user id before any external call.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the id is empty.
pub fn require_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(Error::invalid_argument("user id is required"));
    }
    Ok(())
}

/// Reject an empty contact id before any external call.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the id is empty.
pub fn require_contact_id(contact_id: &str) -> Result<()> {
    if contact_id.is_empty() {
        return Err(Error::invalid_argument("contact id is required"));
    }
    Ok(())
}

/// Apply the presentation ordering rule: sort by name, cap at
/// [`MAX_CONTACTS`].
#[must_use]
pub fn sort_and_cap(mut contacts: Vec<EmergencyContact>) -> Vec<EmergencyContact> {
    contacts.sort_by(|a, b| a.name.cmp(&b.name));
    contacts.truncate(MAX_CONTACTS);
    contacts
}
