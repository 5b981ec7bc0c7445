//! Emergency contact types, validation, and number normalization.
//!
//! An emergency contact is a trusted person with a name and a
//! WhatsApp-capable phone number. A user owns at most [`MAX_CONTACTS`]
//! of them; the cap is enforced again at write time by the store.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The hard cap on emergency contacts per user.
pub const MAX_CONTACTS: usize = 6;

/// Minimum length of a contact number, including a leading `+`.
pub const MIN_NUMBER_LEN: usize = 10;

/// Maximum length of a contact name.
pub const MAX_NAME_LEN: usize = 50;

/// E.164-style shape accepted for contact numbers at input time.
const NUMBER_PATTERN: &str = r"^\+?[1-9]\d{1,14}$";

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NUMBER_PATTERN).expect("static pattern compiles"))
}

/// A stored emergency contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    /// Store-assigned document identifier; absent before first save.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name of the contact.
    pub name: String,

    /// Internationally formatted WhatsApp number, e.g. `+1234567890`.
    pub whatsapp_number: String,

    /// When the contact document was created (store-managed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the contact document was last updated (store-managed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating a new emergency contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    /// Display name of the contact.
    pub name: String,
    /// Internationally formatted WhatsApp number.
    pub whatsapp_number: String,
}

impl NewContact {
    /// Create a new contact input.
    #[must_use]
    pub fn new(name: impl Into<String>, whatsapp_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            whatsapp_number: whatsapp_number.into(),
        }
    }

    /// Validate both fields against the input rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the name or number is malformed.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_number(&self.whatsapp_number)
    }
}

/// A partial update to an existing contact; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    /// Replacement name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replacement number, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
}

impl ContactPatch {
    /// A patch that only replaces the name.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A patch that only replaces the number.
    #[must_use]
    pub fn number(number: impl Into<String>) -> Self {
        Self {
            whatsapp_number: Some(number.into()),
            ..Self::default()
        }
    }

    /// Check whether the patch changes anything at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.whatsapp_number.is_none()
    }

    /// Validate the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a provided field is malformed.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(number) = &self.whatsapp_number {
            validate_number(number)?;
        }
        Ok(())
    }

    /// Apply the patch onto an existing contact, merge-style.
    pub fn apply_to(&self, contact: &mut EmergencyContact) {
        if let Some(name) = &self.name {
            contact.name.clone_from(name);
        }
        if let Some(number) = &self.whatsapp_number {
            contact.whatsapp_number.clone_from(number);
        }
    }
}

/// Validate a contact name (1 to [`MAX_NAME_LEN`] characters).
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the name is empty or too long.
pub fn validate_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 {
        return Err(Error::invalid_argument("contact name is required"));
    }
    if len > MAX_NAME_LEN {
        return Err(Error::invalid_argument(format!(
            "contact name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a contact number against the input rules.
///
/// The number must be at least [`MIN_NUMBER_LEN`] characters long and match
/// `+?[1-9]\d{1,14}` (digits with an optional leading `+`, no separators).
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the number is malformed.
pub fn validate_number(number: &str) -> Result<()> {
    if number.len() < MIN_NUMBER_LEN {
        return Err(Error::invalid_argument(format!(
            "WhatsApp number must be at least {MIN_NUMBER_LEN} digits"
        )));
    }
    if !number_regex().is_match(number) {
        return Err(Error::invalid_argument(
            "invalid WhatsApp number format (e.g., +1234567890)",
        ));
    }
    Ok(())
}

/// Normalize a stored number for dispatch.
///
/// Strips every non-digit character, preserving a single leading `+` when
/// the original number started with one.
#[must_use]
pub fn normalize_number(raw: &str) -> String {
    let digits = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();
    if let Some(rest) = raw.strip_prefix('+') {
        format!("+{}", digits(rest))
    } else {
        digits(raw)
    }
}
