//! Contact form state machine: field edits, validation, submission and the
//! status banner derived from it.

use std::{
    collections::BTreeMap,
    panic::AssertUnwindSafe,
    sync::{Arc, OnceLock},
};

use futures::FutureExt;
use regex::Regex;
use site_shared::{
    domain::{FieldKey, SubmissionState},
    error::SubmitError,
    protocol::ContactPayload,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::relay::FormRelay;

pub const NAME_REQUIRED: &str = "Name is required.";
pub const EMAIL_REQUIRED: &str = "Email is required.";
pub const EMAIL_INVALID: &str = "Please enter a valid email address.";
pub const SUBJECT_REQUIRED: &str = "Subject is required.";
pub const MESSAGE_REQUIRED: &str = "Message is required.";

pub const SUCCESS_TEXT: &str = "Message sent! I'll get back to you soon.";
pub const FAILURE_TEXT: &str = "Something went wrong. Please try again.";
pub const SUBMIT_LABEL: &str = "Send Message";
pub const SUBMITTING_LABEL: &str = "Sending...";

fn email_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"))
}

/// Loose shape check: `local@domain.tld` with no whitespace and a single `@`.
pub fn is_plausible_email(value: &str) -> bool {
    email_shape_re().is_match(value)
}

/// Builds a fresh error map for `fields`. An empty map means the form is valid.
pub fn validate_fields(fields: &ContactPayload) -> BTreeMap<FieldKey, String> {
    let mut errors = BTreeMap::new();
    if fields.name.trim().is_empty() {
        errors.insert(FieldKey::Name, NAME_REQUIRED.to_string());
    }
    if fields.email.trim().is_empty() {
        errors.insert(FieldKey::Email, EMAIL_REQUIRED.to_string());
    } else if !is_plausible_email(&fields.email) {
        errors.insert(FieldKey::Email, EMAIL_INVALID.to_string());
    }
    if fields.subject.trim().is_empty() {
        errors.insert(FieldKey::Subject, SUBJECT_REQUIRED.to_string());
    }
    if fields.message.trim().is_empty() {
        errors.insert(FieldKey::Message, MESSAGE_REQUIRED.to_string());
    }
    errors
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    #[error("form has validation errors")]
    Invalid,
    #[error("a submission is already in flight")]
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBanner {
    Success,
    Failure,
}

impl StatusBanner {
    pub fn text(self) -> &'static str {
        match self {
            StatusBanner::Success => SUCCESS_TEXT,
            StatusBanner::Failure => FAILURE_TEXT,
        }
    }

    pub fn is_dismissable(self) -> bool {
        matches!(self, StatusBanner::Success)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    fields: ContactPayload,
    errors: BTreeMap<FieldKey, String>,
    submission: SubmissionState,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, key: FieldKey) -> &str {
        self.fields.field(key)
    }

    pub fn fields(&self) -> &ContactPayload {
        &self.fields
    }

    pub fn error(&self, key: FieldKey) -> Option<&str> {
        self.errors.get(&key).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<FieldKey, String> {
        &self.errors
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.submission
    }

    /// Stores the new value and drops any error shown for that field. The
    /// field is not re-validated until the next submit attempt.
    pub fn update_field(&mut self, key: FieldKey, value: impl Into<String>) {
        *self.fields.field_mut(key) = value.into();
        self.errors.remove(&key);
    }

    /// Replaces the error map with a freshly computed one.
    pub fn validate(&mut self) -> bool {
        self.errors = validate_fields(&self.fields);
        self.errors.is_empty()
    }

    /// Moves to `Submitting` and returns the payload captured at this moment.
    pub fn begin_submission(&mut self) -> Result<ContactPayload, SubmitRejection> {
        if !self.validate() {
            return Err(SubmitRejection::Invalid);
        }
        if self.submission == SubmissionState::Submitting {
            return Err(SubmitRejection::InFlight);
        }
        self.submission = SubmissionState::Submitting;
        Ok(self.fields.clone())
    }

    /// Applies the relay outcome. Input is only cleared on success.
    pub fn complete_submission(&mut self, outcome: &Result<(), SubmitError>) {
        if self.submission != SubmissionState::Submitting {
            warn!(state = ?self.submission, "ignoring submission outcome with nothing in flight");
            return;
        }
        match outcome {
            Ok(()) => {
                self.submission = SubmissionState::Succeeded;
                self.fields = ContactPayload::default();
            }
            Err(_) => self.submission = SubmissionState::Failed,
        }
    }

    pub fn dismiss_status(&mut self) {
        if self.submission.is_terminal() {
            self.submission = SubmissionState::Idle;
        }
    }

    pub fn status_banner(&self) -> Option<StatusBanner> {
        match self.submission {
            SubmissionState::Succeeded => Some(StatusBanner::Success),
            SubmissionState::Failed => Some(StatusBanner::Failure),
            SubmissionState::Idle | SubmissionState::Submitting => None,
        }
    }

    pub fn submit_enabled(&self) -> bool {
        self.submission != SubmissionState::Submitting
    }

    pub fn submit_label(&self) -> &'static str {
        if self.submission == SubmissionState::Submitting {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        }
    }
}

/// Owns the contact form for the lifetime of one mount.
///
/// The state lock is held only while validating and while applying the
/// outcome, so edits stay possible while a request is in flight. Delivery
/// runs on its own task: once dispatched it completes and always moves the
/// form out of `Submitting`, even if the caller stops waiting.
pub struct ContactFormController {
    relay: Arc<dyn FormRelay>,
    state: Arc<Mutex<FormState>>,
}

impl ContactFormController {
    pub fn new(relay: Arc<dyn FormRelay>) -> Self {
        Self {
            relay,
            state: Arc::new(Mutex::new(FormState::new())),
        }
    }

    pub async fn update_field(&self, key: FieldKey, value: impl Into<String>) {
        self.state.lock().await.update_field(key, value);
    }

    pub async fn validate(&self) -> bool {
        self.state.lock().await.validate()
    }

    pub async fn dismiss_status(&self) {
        self.state.lock().await.dismiss_status();
    }

    pub async fn snapshot(&self) -> FormState {
        self.state.lock().await.clone()
    }

    /// Validates, dispatches exactly one relay call and returns the terminal
    /// state it produced.
    pub async fn submit(&self) -> Result<SubmissionState, SubmitRejection> {
        let payload = {
            let mut guard = self.state.lock().await;
            match guard.begin_submission() {
                Ok(payload) => payload,
                Err(rejection) => {
                    debug!(%rejection, "contact submission not dispatched");
                    return Err(rejection);
                }
            }
        };

        let relay = Arc::clone(&self.relay);
        let state = Arc::clone(&self.state);
        let delivery = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(relay.deliver(&payload))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(SubmitError::Transport("form relay panicked".to_string())));

            match &outcome {
                Ok(()) => info!("contact form submitted"),
                Err(err) => error!(error = %err, "contact form submission failed"),
            }

            let mut guard = state.lock().await;
            guard.complete_submission(&outcome);
            guard.submission_state()
        });

        match delivery.await {
            Ok(terminal) => Ok(terminal),
            Err(join_err) => {
                error!(error = %join_err, "contact delivery task did not finish");
                let mut guard = self.state.lock().await;
                guard.complete_submission(&Err(SubmitError::Transport(join_err.to_string())));
                Ok(guard.submission_state())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
