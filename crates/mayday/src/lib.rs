//! `mayday` - personal-safety SOS dispatch toolkit
//!
//! This library provides the core functionality for managing a user's
//! emergency contacts and composing one-shot SOS dispatches: a fresh
//! position fix, an optionally AI-enhanced distress message, and one
//! pre-filled `wa.me` link per contact.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod config;
pub mod contact;
pub mod enhance;
pub mod error;
pub mod locate;
pub mod logging;
pub mod session;
pub mod sos;
pub mod store;

pub use config::Config;
pub use contact::{ContactPatch, EmergencyContact, NewContact, MAX_CONTACTS};
pub use enhance::{EnhanceRequest, EnhanceResponse, Enhancement, Enhancer};
pub use error::{Error, Result};
pub use locate::{GeoFix, LocateError, LocateErrorKind, Locator};
pub use logging::init_logging;
pub use session::{IdentityGateway, SessionContext, SessionSubscription, User};
pub use sos::{SosComposer, SosOptions, SosReport, DEFAULT_DISTRESS_MESSAGE};
pub use store::ContactStore;
