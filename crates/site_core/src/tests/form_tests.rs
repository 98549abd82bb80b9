use super::*;
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Notify;

struct ScriptedRelay {
    outcome: Result<(), SubmitError>,
    calls: AtomicUsize,
    payloads: std::sync::Mutex<Vec<ContactPayload>>,
    entered: Arc<Notify>,
    release: Option<Arc<Notify>>,
}

impl ScriptedRelay {
    fn ok() -> Self {
        Self::with_outcome(Ok(()))
    }

    fn failing(err: SubmitError) -> Self {
        Self::with_outcome(Err(err))
    }

    fn with_outcome(outcome: Result<(), SubmitError>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            payloads: std::sync::Mutex::new(Vec::new()),
            entered: Arc::new(Notify::new()),
            release: None,
        }
    }

    fn gated(mut self) -> Self {
        self.release = Some(Arc::new(Notify::new()));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn payloads(&self) -> Vec<ContactPayload> {
        self.payloads.lock().expect("payloads").clone()
    }
}

#[async_trait]
impl FormRelay for ScriptedRelay {
    async fn deliver(&self, payload: &ContactPayload) -> Result<(), SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().expect("payloads").push(payload.clone());
        self.entered.notify_one();
        if let Some(release) = &self.release {
            release.notified().await;
        }
        self.outcome.clone()
    }
}

struct PanickingRelay;

#[async_trait]
impl FormRelay for PanickingRelay {
    async fn deliver(&self, _payload: &ContactPayload) -> Result<(), SubmitError> {
        panic!("relay blew up");
    }
}

fn filled_state() -> FormState {
    let mut state = FormState::new();
    state.update_field(FieldKey::Name, "Ada Lovelace");
    state.update_field(FieldKey::Email, "ada@example.com");
    state.update_field(FieldKey::Subject, "Engine");
    state.update_field(FieldKey::Message, "Let's talk.");
    state
}

async fn fill(controller: &ContactFormController) {
    controller.update_field(FieldKey::Name, "Ada Lovelace").await;
    controller.update_field(FieldKey::Email, "ada@example.com").await;
    controller.update_field(FieldKey::Subject, "Engine").await;
    controller.update_field(FieldKey::Message, "Let's talk.").await;
}

#[test]
fn each_empty_field_yields_only_its_required_error() {
    let expected = [
        (FieldKey::Name, NAME_REQUIRED),
        (FieldKey::Email, EMAIL_REQUIRED),
        (FieldKey::Subject, SUBJECT_REQUIRED),
        (FieldKey::Message, MESSAGE_REQUIRED),
    ];
    for (key, message) in expected {
        let mut state = filled_state();
        state.update_field(key, "   ");

        let rejection = state.begin_submission().expect_err("must reject");

        assert_eq!(rejection, SubmitRejection::Invalid);
        assert_eq!(state.errors().len(), 1, "field {key}");
        assert_eq!(state.error(key), Some(message));
        assert_eq!(state.submission_state(), SubmissionState::Idle);
    }
}

#[test]
fn email_checks_are_mutually_exclusive() {
    let mut state = filled_state();

    state.update_field(FieldKey::Email, "a@b.com");
    assert!(state.validate());

    state.update_field(FieldKey::Email, "");
    assert!(!state.validate());
    assert_eq!(state.error(FieldKey::Email), Some(EMAIL_REQUIRED));

    state.update_field(FieldKey::Email, "not-an-email");
    assert!(!state.validate());
    assert_eq!(state.error(FieldKey::Email), Some(EMAIL_INVALID));
    assert_eq!(state.errors().len(), 1);
}

#[test]
fn email_shape_is_loose_but_not_empty_handed() {
    assert!(is_plausible_email("first.last@sub.example.co"));
    assert!(is_plausible_email("a+tag@b.c"));
    assert!(!is_plausible_email("a@b"));
    assert!(!is_plausible_email("a@.com."));
    assert!(!is_plausible_email("a b@c.com"));
    assert!(!is_plausible_email("a@@b.com"));
    assert!(!is_plausible_email("@b.com"));
    assert!(!is_plausible_email(" a@b.com"));
}

#[test]
fn editing_a_field_clears_only_its_error() {
    let mut state = FormState::new();
    assert!(!state.validate());
    assert_eq!(state.errors().len(), 4);

    state.update_field(FieldKey::Email, "still wrong");

    assert_eq!(state.error(FieldKey::Email), None);
    assert_eq!(state.error(FieldKey::Name), Some(NAME_REQUIRED));
    assert_eq!(state.errors().len(), 3);
}

#[test]
fn validation_rebuilds_errors_from_scratch() {
    let mut state = FormState::new();
    assert!(!state.validate());

    state.update_field(FieldKey::Name, "Ada");
    state.update_field(FieldKey::Email, "ada@example.com");
    state.update_field(FieldKey::Subject, "Hi");
    state.update_field(FieldKey::Message, "Hello");
    state.update_field(FieldKey::Email, "broken");

    assert!(!state.validate());
    assert_eq!(state.errors().len(), 1);
    assert_eq!(state.error(FieldKey::Email), Some(EMAIL_INVALID));
}

#[test]
fn outcome_without_inflight_submission_is_ignored() {
    let mut state = filled_state();
    state.complete_submission(&Ok(()));

    assert_eq!(state.submission_state(), SubmissionState::Idle);
    assert_eq!(state.field(FieldKey::Name), "Ada Lovelace");
}

#[test]
fn display_contract_follows_submission_state() {
    let mut state = filled_state();
    assert_eq!(state.status_banner(), None);
    assert!(state.submit_enabled());
    assert_eq!(state.submit_label(), SUBMIT_LABEL);

    state.begin_submission().expect("begin");
    assert_eq!(state.status_banner(), None);
    assert!(!state.submit_enabled());
    assert_eq!(state.submit_label(), SUBMITTING_LABEL);

    state.complete_submission(&Err(SubmitError::Status(503)));
    let banner = state.status_banner().expect("banner");
    assert_eq!(banner, StatusBanner::Failure);
    assert_eq!(banner.text(), FAILURE_TEXT);
    assert!(state.submit_enabled());

    state.dismiss_status();
    assert_eq!(state.submission_state(), SubmissionState::Idle);
    assert_eq!(state.status_banner(), None);
}

#[test]
fn dismiss_is_a_noop_outside_terminal_states() {
    let mut state = filled_state();
    state.begin_submission().expect("begin");
    state.dismiss_status();
    assert_eq!(state.submission_state(), SubmissionState::Submitting);
}

#[tokio::test]
async fn invalid_submit_makes_no_network_call() {
    let relay = Arc::new(ScriptedRelay::ok());
    let controller = ContactFormController::new(relay.clone());
    controller.update_field(FieldKey::Name, "Ada").await;

    let rejection = controller.submit().await.expect_err("must reject");

    assert_eq!(rejection, SubmitRejection::Invalid);
    assert_eq!(relay.calls(), 0);
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.submission_state(), SubmissionState::Idle);
    assert_eq!(snapshot.errors().len(), 3);
}

#[tokio::test]
async fn successful_submission_clears_every_field() {
    let relay = Arc::new(ScriptedRelay::ok());
    let controller = ContactFormController::new(relay.clone());
    fill(&controller).await;

    let terminal = controller.submit().await.expect("dispatched");

    assert_eq!(terminal, SubmissionState::Succeeded);
    assert_eq!(relay.calls(), 1);
    assert_eq!(relay.payloads()[0].email, "ada@example.com");
    let snapshot = controller.snapshot().await;
    for key in FieldKey::ALL {
        assert_eq!(snapshot.field(key), "", "field {key}");
    }
    assert!(snapshot.errors().is_empty());
    assert_eq!(snapshot.status_banner(), Some(StatusBanner::Success));
    assert_eq!(StatusBanner::Success.text(), SUCCESS_TEXT);
}

#[tokio::test]
async fn server_error_fails_and_keeps_typed_input() {
    let relay = Arc::new(ScriptedRelay::failing(SubmitError::Status(500)));
    let controller = ContactFormController::new(relay.clone());
    fill(&controller).await;

    let terminal = controller.submit().await.expect("dispatched");

    assert_eq!(terminal, SubmissionState::Failed);
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.field(FieldKey::Name), "Ada Lovelace");
    assert_eq!(snapshot.field(FieldKey::Email), "ada@example.com");
    assert_eq!(snapshot.field(FieldKey::Subject), "Engine");
    assert_eq!(snapshot.field(FieldKey::Message), "Let's talk.");
    assert_eq!(
        snapshot.status_banner().map(StatusBanner::text),
        Some(FAILURE_TEXT)
    );
}

#[tokio::test]
async fn second_submit_while_in_flight_is_rejected() {
    let relay = Arc::new(ScriptedRelay::ok().gated());
    let controller = Arc::new(ContactFormController::new(relay.clone()));
    fill(&controller).await;

    let first = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.submit().await }
    });
    relay.entered.notified().await;

    let second = controller.submit().await;
    assert_eq!(second, Err(SubmitRejection::InFlight));
    assert_eq!(relay.calls(), 1);

    relay.release.as_ref().expect("gate").notify_one();
    let first = first.await.expect("join").expect("dispatched");
    assert_eq!(first, SubmissionState::Succeeded);
    assert_eq!(relay.calls(), 1);
}

#[tokio::test]
async fn edits_during_flight_do_not_change_the_payload() {
    let relay = Arc::new(ScriptedRelay::failing(SubmitError::Timeout).gated());
    let controller = Arc::new(ContactFormController::new(relay.clone()));
    fill(&controller).await;

    let pending = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.submit().await }
    });
    relay.entered.notified().await;

    controller.update_field(FieldKey::Message, "edited meanwhile").await;
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.submission_state(), SubmissionState::Submitting);
    assert!(!snapshot.submit_enabled());

    relay.release.as_ref().expect("gate").notify_one();
    pending.await.expect("join").expect("dispatched");

    assert_eq!(relay.payloads()[0].message, "Let's talk.");
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.field(FieldKey::Message), "edited meanwhile");
}

#[tokio::test]
async fn retry_moves_straight_back_to_submitting() {
    let relay = Arc::new(ScriptedRelay::failing(SubmitError::Status(502)).gated());
    let controller = Arc::new(ContactFormController::new(relay.clone()));
    fill(&controller).await;
    let release = Arc::clone(relay.release.as_ref().expect("gate"));

    release.notify_one();
    assert_eq!(controller.submit().await, Ok(SubmissionState::Failed));
    relay.entered.notified().await;

    let retry = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.submit().await }
    });
    relay.entered.notified().await;
    assert_eq!(
        controller.snapshot().await.submission_state(),
        SubmissionState::Submitting
    );

    release.notify_one();
    assert_eq!(retry.await.expect("join"), Ok(SubmissionState::Failed));
    assert_eq!(relay.calls(), 2);
}

#[tokio::test]
async fn invalid_resubmit_keeps_previous_terminal_state() {
    let relay = Arc::new(ScriptedRelay::failing(SubmitError::Status(500)));
    let controller = ContactFormController::new(relay.clone());
    fill(&controller).await;
    controller.submit().await.expect("dispatched");

    controller.update_field(FieldKey::Email, "nope").await;
    let rejection = controller.submit().await.expect_err("must reject");

    assert_eq!(rejection, SubmitRejection::Invalid);
    assert_eq!(relay.calls(), 1);
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.submission_state(), SubmissionState::Failed);
    assert_eq!(snapshot.error(FieldKey::Email), Some(EMAIL_INVALID));
}

#[tokio::test]
async fn panicking_relay_still_leaves_submitting() {
    let controller = ContactFormController::new(Arc::new(PanickingRelay));
    fill(&controller).await;

    let terminal = tokio::time::timeout(Duration::from_secs(5), controller.submit())
        .await
        .expect("no hang")
        .expect("dispatched");

    assert_eq!(terminal, SubmissionState::Failed);
    assert_eq!(
        controller.snapshot().await.field(FieldKey::Name),
        "Ada Lovelace"
    );
}
