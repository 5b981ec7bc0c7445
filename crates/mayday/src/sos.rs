//! SOS composition and dispatch.
//!
//! One trigger runs a single pass through the phases
//! `Locating → Enhancing → Dispatching`: acquire a fresh fix, attempt the
//! best-effort enhancement, then build one `wa.me` deep link per contact.
//! Nothing here is persisted; the composed request lives only for the
//! duration of the trigger.

use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::contact::{normalize_number, EmergencyContact};
use crate::enhance::{run_enhancement, EnhanceRequest, Enhancement, Enhancer};
use crate::error::{Error, Result};
use crate::locate::{acquire_fix, GeoFix, Locator};
use crate::session::User;

/// The distress text used when no enhancement is available.
pub const DEFAULT_DISTRESS_MESSAGE: &str = "⚠️ I’m in danger. Please help me!";

/// Default bounded wait for the geolocation fix.
pub const DEFAULT_LOCATE_WAIT: Duration = Duration::from_secs(10);

/// Default bounded wait for the enhancement call.
pub const DEFAULT_ENHANCE_WAIT: Duration = Duration::from_secs(10);

/// Observable phases of one SOS trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SosPhase {
    /// Waiting for a trigger.
    Idle,
    /// Acquiring a fresh position fix.
    Locating,
    /// Running the best-effort enhancement.
    Enhancing,
    /// Building per-contact dispatch links.
    Dispatching,
    /// All links built; terminal success.
    Done,
    /// Precondition or location failure; terminal.
    Aborted,
}

impl std::fmt::Display for SosPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Locating => write!(f, "locating"),
            Self::Enhancing => write!(f, "enhancing"),
            Self::Dispatching => write!(f, "dispatching"),
            Self::Done => write!(f, "done"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Tunable knobs for one trigger.
#[derive(Debug, Clone)]
pub struct SosOptions {
    /// The distress text to enhance and fall back to.
    pub default_message: String,
    /// Bounded wait for the position fix.
    pub locate_wait: Duration,
    /// Bounded wait for the enhancement call.
    pub enhance_wait: Duration,
    /// Whether to attempt the enhancement call at all.
    pub enhance_enabled: bool,
}

impl Default for SosOptions {
    fn default() -> Self {
        Self {
            default_message: DEFAULT_DISTRESS_MESSAGE.to_string(),
            locate_wait: DEFAULT_LOCATE_WAIT,
            enhance_wait: DEFAULT_ENHANCE_WAIT,
            enhance_enabled: true,
        }
    }
}

/// The dispatch result for one contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Name of the targeted contact.
    pub contact_name: String,
    /// The contact's number after normalization.
    pub number: String,
    /// The built link, or why this contact was skipped.
    pub outcome: DispatchOutcome,
}

/// Whether a per-contact link could be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The deep link to open for this contact.
    Link(Url),
    /// The number was unusable; the rest of the dispatch proceeds.
    Invalid {
        /// Why no link could be built.
        reason: String,
    },
}

/// The outcome of one completed trigger.
#[derive(Debug, Clone)]
pub struct SosReport {
    /// The fresh fix the message was built around.
    pub fix: GeoFix,
    /// The final message carried by every link.
    pub message: String,
    /// How the enhancement step resolved.
    pub enhancement: Enhancement,
    /// One entry per targeted contact, in list order.
    pub dispatches: Vec<Dispatch>,
}

impl SosReport {
    /// The successfully built links, in contact order.
    pub fn links(&self) -> impl Iterator<Item = &Url> {
        self.dispatches.iter().filter_map(|d| match &d.outcome {
            DispatchOutcome::Link(url) => Some(url),
            DispatchOutcome::Invalid { .. } => None,
        })
    }

    /// Number of contacts that could not be dispatched to.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.dispatches
            .iter()
            .filter(|d| matches!(d.outcome, DispatchOutcome::Invalid { .. }))
            .count()
    }
}

/// Opens dispatch links in a new browser context, one per contact.
pub trait LinkOpener {
    /// Open one link.
    ///
    /// # Errors
    ///
    /// Returns an error if the link could not be handed to the platform.
    fn open(&self, url: &Url) -> std::io::Result<()>;
}

/// Open every built link, isolating per-contact failures.
///
/// Returns the number of links successfully opened. Fire-and-forget: there
/// is no confirmation that any contact received the message.
pub fn open_all(report: &SosReport, opener: &dyn LinkOpener) -> usize {
    let mut opened = 0;
    for dispatch in &report.dispatches {
        match &dispatch.outcome {
            DispatchOutcome::Link(url) => match opener.open(url) {
                Ok(()) => opened += 1,
                Err(err) => {
                    warn!(contact = %dispatch.contact_name, error = %err, "failed to open dispatch link");
                }
            },
            DispatchOutcome::Invalid { reason } => {
                warn!(contact = %dispatch.contact_name, reason = %reason, "skipping contact with unusable number");
            }
        }
    }
    opened
}

/// Composes and dispatches one SOS request per trigger.
pub struct SosComposer<'a> {
    locator: &'a dyn Locator,
    enhancer: &'a dyn Enhancer,
    options: SosOptions,
}

impl std::fmt::Debug for SosComposer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SosComposer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> SosComposer<'a> {
    /// Create a composer over the given sources.
    #[must_use]
    pub fn new(locator: &'a dyn Locator, enhancer: &'a dyn Enhancer, options: SosOptions) -> Self {
        Self {
            locator,
            enhancer,
            options,
        }
    }

    /// Run one trigger for the given user and contact list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] before any location request
    /// if the user is not signed in or has no contacts, or
    /// [`Error::Location`] if no fresh fix could be acquired. Enhancement
    /// failure never aborts the trigger.
    pub async fn trigger(&self, user: &User, contacts: &[EmergencyContact]) -> Result<SosReport> {
        if user.uid.is_empty() {
            return Err(Error::precondition_failed("not signed in"));
        }
        if contacts.is_empty() {
            return Err(Error::precondition_failed(
                "no emergency contacts configured",
            ));
        }

        debug!(phase = %SosPhase::Locating, contacts = contacts.len(), "acquiring fresh position fix");
        let fix = acquire_fix(self.locator, self.options.locate_wait).await?;
        let map_link = fix.map_link();

        debug!(phase = %SosPhase::Enhancing, "running best-effort enhancement");
        let enhancement = if self.options.enhance_enabled {
            let request = EnhanceRequest {
                latitude: fix.latitude,
                longitude: fix.longitude,
                distress_message: self.options.default_message.clone(),
            };
            run_enhancement(self.enhancer, request, self.options.enhance_wait).await
        } else {
            Enhancement::degraded("enhancement disabled by configuration")
        };

        let message = final_message(&self.options.default_message, &map_link, &enhancement);

        debug!(phase = %SosPhase::Dispatching, "building dispatch links");
        let dispatches = contacts
            .iter()
            .map(|contact| build_dispatch(contact, &message))
            .collect();

        let report = SosReport {
            fix,
            message,
            enhancement,
            dispatches,
        };
        info!(
            phase = %SosPhase::Done,
            links = report.links().count(),
            skipped = report.failed_count(),
            "SOS composed"
        );
        Ok(report)
    }
}

/// Assemble the final message from the enhancement outcome.
///
/// An applied enhancement replaces the default text wholesale; the map
/// link is re-appended if the rewrite dropped it, and any suggested
/// numbers are appended as trailing text. A degraded outcome is always
/// `default + map link`.
#[must_use]
pub fn final_message(default: &str, map_link: &str, enhancement: &Enhancement) -> String {
    match enhancement {
        Enhancement::Applied {
            message,
            suggested_numbers,
        } => {
            let mut out = message.clone();
            if !out.contains(map_link) {
                out.push_str(&format!(" My current location: {map_link}"));
            }
            if !suggested_numbers.is_empty() {
                out.push_str(&format!(
                    " Suggested emergency numbers: {}",
                    suggested_numbers.join(", ")
                ));
            }
            out
        }
        Enhancement::Degraded { .. } => {
            format!("{default} My current location: {map_link}")
        }
    }
}

/// Build the dispatch entry for one contact.
fn build_dispatch(contact: &EmergencyContact, message: &str) -> Dispatch {
    let number = normalize_number(&contact.whatsapp_number);
    let outcome = match dispatch_link(&number, message) {
        Ok(url) => DispatchOutcome::Link(url),
        Err(reason) => DispatchOutcome::Invalid { reason },
    };
    Dispatch {
        contact_name: contact.name.clone(),
        number,
        outcome,
    }
}

/// Build the `wa.me` deep link for one normalized number.
///
/// # Errors
///
/// Returns a reason string when the normalized number has no digits left
/// or the URL cannot be formed.
pub fn dispatch_link(normalized_number: &str, message: &str) -> std::result::Result<Url, String> {
    if normalized_number.trim_start_matches('+').is_empty() {
        return Err("number has no digits after normalization".to_string());
    }
    let mut url = Url::parse(&format!("https://wa.me/{normalized_number}"))
        .map_err(|err| format!("invalid dispatch URL: {err}"))?;
    url.query_pairs_mut().append_pair("text", message);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhance::{EnhanceError, EnhanceResponse};
    use crate::locate::LocateError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedLocator {
        fix: GeoFix,
        calls: AtomicUsize,
    }

    impl FixedLocator {
        fn at(latitude: f64, longitude: f64) -> Self {
            Self {
                fix: GeoFix::new(latitude, longitude),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Locator for FixedLocator {
        async fn locate(&self) -> std::result::Result<GeoFix, LocateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.fix)
        }
    }

    struct DeniedLocator;

    #[async_trait]
    impl Locator for DeniedLocator {
        async fn locate(&self) -> std::result::Result<GeoFix, LocateError> {
            Err(LocateError::permission_denied("user declined"))
        }
    }

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

    fn failing_enhancer() -> ScriptedEnhancer {
        ScriptedEnhancer(Err(EnhanceError::Transport("offline".to_string())))
    }

    fn user() -> User {
        User {
            uid: "u1".to_string(),
            email: None,
            display_name: None,
        }
    }

    fn contact(name: &str, number: &str) -> EmergencyContact {
        EmergencyContact {
            id: Some(format!("id-{name}")),
            name: name.to_string(),
            whatsapp_number: number.to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    fn decoded_text(url: &Url) -> String {
        url.query_pairs()
            .find(|(k, _)| k == "text")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default()
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SosPhase::Locating.to_string(), "locating");
        assert_eq!(SosPhase::Aborted.to_string(), "aborted");
    }

    #[test]
    fn test_final_message_degraded_uses_default_and_map_link() {
        let message = final_message(
            DEFAULT_DISTRESS_MESSAGE,
            "https://maps.google.com/?q=1,2",
            &Enhancement::degraded("offline"),
        );
        assert_eq!(
            message,
            format!("{DEFAULT_DISTRESS_MESSAGE} My current location: https://maps.google.com/?q=1,2")
        );
    }

    #[test]
    fn test_final_message_appends_map_link_when_rewrite_drops_it() {
        let enhancement = Enhancement::Applied {
            message: "Emergency, please respond.".to_string(),
            suggested_numbers: Vec::new(),
        };
        let message = final_message("d", "https://maps.google.com/?q=1,2", &enhancement);
        assert!(message.starts_with("Emergency, please respond."));
        assert!(message.contains("My current location: https://maps.google.com/?q=1,2"));
    }

    #[test]
    fn test_final_message_keeps_map_link_when_present() {
        let enhancement = Enhancement::Applied {
            message: "SOS at https://maps.google.com/?q=1,2 now".to_string(),
            suggested_numbers: Vec::new(),
        };
        let message = final_message("d", "https://maps.google.com/?q=1,2", &enhancement);
        assert_eq!(message, "SOS at https://maps.google.com/?q=1,2 now");
    }

    #[test]
    fn test_final_message_appends_suggested_numbers() {
        let enhancement = Enhancement::Applied {
            message: "SOS https://maps.google.com/?q=1,2".to_string(),
            suggested_numbers: vec!["911".to_string(), "112".to_string()],
        };
        let message = final_message("d", "https://maps.google.com/?q=1,2", &enhancement);
        assert!(message.ends_with("Suggested emergency numbers: 911, 112"));
    }

    #[test]
    fn test_dispatch_link_shape() {
        let url = dispatch_link("+15551234567", "hello there").unwrap();
        assert_eq!(url.host_str(), Some("wa.me"));
        assert_eq!(url.path(), "/+15551234567");
        assert_eq!(decoded_text(&url), "hello there");
    }

    #[test]
    fn test_dispatch_link_rejects_empty_number() {
        assert!(dispatch_link("", "msg").is_err());
        assert!(dispatch_link("+", "msg").is_err());
    }

    #[tokio::test]
    async fn test_trigger_without_contacts_aborts_before_locating() {
        let locator = FixedLocator::at(1.0, 2.0);
        let enhancer = failing_enhancer();
        let composer = SosComposer::new(&locator, &enhancer, SosOptions::default());

        let err = composer.trigger(&user(), &[]).await.unwrap_err();
        assert!(err.is_precondition_failed());
        assert_eq!(locator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_trigger_without_user_aborts() {
        let locator = FixedLocator::at(1.0, 2.0);
        let enhancer = failing_enhancer();
        let composer = SosComposer::new(&locator, &enhancer, SosOptions::default());

        let anonymous = User {
            uid: String::new(),
            email: None,
            display_name: None,
        };
        let err = composer
            .trigger(&anonymous, &[contact("Mom", "+15551234567")])
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
    }

    #[tokio::test]
    async fn test_trigger_aborts_on_location_denial() {
        let enhancer = failing_enhancer();
        let composer = SosComposer::new(&DeniedLocator, &enhancer, SosOptions::default());

        let err = composer
            .trigger(&user(), &[contact("Mom", "+15551234567")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Location(_)));
    }

    #[tokio::test]
    async fn test_trigger_with_failing_enhancer_still_dispatches_default() {
        let locator = FixedLocator::at(37.0, -122.0);
        let enhancer = failing_enhancer();
        let composer = SosComposer::new(&locator, &enhancer, SosOptions::default());

        let report = composer
            .trigger(&user(), &[contact("Mom", "+15551234567")])
            .await
            .unwrap();

        assert!(report.enhancement.is_degraded());
        assert!(report.message.contains(DEFAULT_DISTRESS_MESSAGE));
        assert!(report.message.contains("https://maps.google.com/?q=37,-122"));
        assert_eq!(report.links().count(), 1);
    }

    #[tokio::test]
    async fn test_trigger_mom_scenario_with_enhancer_timeout() {
        let locator = FixedLocator::at(37.422, -122.084);
        let mut options = SosOptions::default();
        options.enhance_wait = Duration::from_millis(20);
        let composer = SosComposer::new(&locator, &StalledEnhancer, options);

        let report = composer
            .trigger(&user(), &[contact("Mom", "+15551234567")])
            .await
            .unwrap();

        assert_eq!(report.dispatches.len(), 1);
        let url = report.links().next().unwrap();
        assert_eq!(url.host_str(), Some("wa.me"));
        assert_eq!(url.path(), "/+15551234567");
        assert_eq!(
            decoded_text(url),
            format!(
                "{DEFAULT_DISTRESS_MESSAGE} My current location: https://maps.google.com/?q=37.422,-122.084"
            )
        );
    }

    #[tokio::test]
    async fn test_trigger_applies_enhancement() {
        let locator = FixedLocator::at(1.0, 2.0);
        let enhancer = ScriptedEnhancer(Ok(EnhanceResponse {
            enhanced_message: "Urgent help needed.".to_string(),
            suggested_numbers: vec!["911".to_string()],
        }));
        let composer = SosComposer::new(&locator, &enhancer, SosOptions::default());

        let report = composer
            .trigger(&user(), &[contact("Mom", "+15551234567")])
            .await
            .unwrap();

        assert!(!report.enhancement.is_degraded());
        assert!(report.message.starts_with("Urgent help needed."));
        assert!(report.message.contains("https://maps.google.com/?q=1,2"));
        assert!(report.message.contains("Suggested emergency numbers: 911"));
    }

    #[tokio::test]
    async fn test_trigger_with_enhancement_disabled_skips_call() {
        let locator = FixedLocator::at(1.0, 2.0);
        let composer = SosComposer::new(
            &locator,
            &StalledEnhancer,
            SosOptions {
                enhance_enabled: false,
                ..SosOptions::default()
            },
        );

        let report = composer
            .trigger(&user(), &[contact("Mom", "+15551234567")])
            .await
            .unwrap();
        assert!(report.enhancement.is_degraded());
    }

    #[tokio::test]
    async fn test_malformed_number_does_not_block_others() {
        let locator = FixedLocator::at(1.0, 2.0);
        let enhancer = failing_enhancer();
        let composer = SosComposer::new(&locator, &enhancer, SosOptions::default());

        let contacts = vec![
            contact("Bad", "+"),
            contact("Mom", "+15551234567"),
            contact("Dad", "+15559876543"),
        ];
        let report = composer.trigger(&user(), &contacts).await.unwrap();

        assert_eq!(report.dispatches.len(), 3);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.links().count(), 2);
    }

    #[test]
    fn test_open_all_isolates_failures() {
        struct FlakyOpener {
            opened: Mutex<Vec<String>>,
        }

        impl LinkOpener for FlakyOpener {
            fn open(&self, url: &Url) -> std::io::Result<()> {
                if url.path().contains("555123") {
                    return Err(std::io::Error::other("no browser"));
                }
                self.opened.lock().unwrap().push(url.path().to_string());
                Ok(())
            }
        }

        let report = SosReport {
            fix: GeoFix::new(1.0, 2.0),
            message: "msg".to_string(),
            enhancement: Enhancement::degraded("x"),
            dispatches: vec![
                Dispatch {
                    contact_name: "Mom".to_string(),
                    number: "+15551234567".to_string(),
                    outcome: DispatchOutcome::Link(
                        dispatch_link("+15551234567", "msg").unwrap(),
                    ),
                },
                Dispatch {
                    contact_name: "Dad".to_string(),
                    number: "+15559876543".to_string(),
                    outcome: DispatchOutcome::Link(
                        dispatch_link("+15559876543", "msg").unwrap(),
                    ),
                },
            ],
        };

        let opener = FlakyOpener {
            opened: Mutex::new(Vec::new()),
        };
        let opened = open_all(&report, &opener);
        assert_eq!(opened, 1);
        assert_eq!(opener.opened.lock().unwrap().as_slice(), ["/+15559876543"]);
    }
}
