use super::*;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::{sync::oneshot, task::JoinHandle};

use crate::error::{GENERIC_FAILURE_MESSAGE, MALFORMED_RESPONSE_MESSAGE};

type Reply = Result<PredictionResponse, PredictionError>;

/// Answers by payload location; gated replies wait until released.
#[derive(Default)]
struct ScriptedService {
    replies: Mutex<HashMap<String, (Option<oneshot::Receiver<()>>, Reply)>>,
    seen: Mutex<Vec<RequestPayload>>,
}

impl ScriptedService {
    async fn reply(&self, location: &str, reply: Reply) {
        self.replies
            .lock()
            .await
            .insert(location.to_string(), (None, reply));
    }

    async fn gated_reply(&self, location: &str, reply: Reply) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.replies
            .lock()
            .await
            .insert(location.to_string(), (Some(rx), reply));
        tx
    }
}

#[async_trait]
impl PredictionService for ScriptedService {
    async fn predict(&self, payload: &RequestPayload) -> Result<PredictionResponse, PredictionError> {
        self.seen.lock().await.push(payload.clone());
        let entry = self.replies.lock().await.remove(&payload.location);
        let Some((gate, reply)) = entry else {
            return Err(PredictionError::Transport(format!(
                "no scripted reply for {}",
                payload.location
            )));
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        reply
    }

    async fn health(&self) -> Result<HealthResponse, PredictionError> {
        Ok(HealthResponse {
            status: "healthy".into(),
            version: "1.0.0".into(),
        })
    }
}

async fn fill_form(controller: &FormController, location: &str) {
    controller.update_field(FormField::Location, location).await;
    controller.update_field(FormField::AreaSqft, "1000").await;
    controller.update_field(FormField::Bhk, "2").await;
    controller.update_field(FormField::Bathrooms, "2").await;
}

fn spawn_submit(controller: &Arc<FormController>) -> JoinHandle<SubmitOutcome> {
    let controller = Arc::clone(controller);
    tokio::spawn(async move { controller.submit().await })
}

async fn wait_for_start(events: &mut broadcast::Receiver<ControllerEvent>) -> u64 {
    loop {
        match events.recv().await.expect("controller event") {
            ControllerEvent::SubmissionStarted { token, .. } => return token,
            _ => continue,
        }
    }
}

fn assert_exclusive(snapshot: &ControllerSnapshot) {
    assert!(
        !(snapshot.prediction.is_some() && snapshot.error.is_some()),
        "prediction and error must never both be set: {snapshot:?}"
    );
}

#[tokio::test]
async fn starts_idle_without_prediction_or_error() {
    let controller = FormController::new(Arc::new(ScriptedService::default()));
    let snapshot = controller.snapshot().await;

    assert_eq!(snapshot.phase, SubmissionPhase::Idle);
    assert!(!snapshot.in_flight);
    assert_eq!(snapshot.prediction, None);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.form, FormState::default());
}

#[tokio::test]
async fn update_field_only_touches_named_key() {
    let controller = FormController::new(Arc::new(ScriptedService::default()));
    controller.update_field(FormField::Bhk, "3").await;

    let form = controller.snapshot().await.form;
    assert_eq!(form.bhk, "3");
    assert_eq!(
        FormState {
            bhk: String::new(),
            ..form
        },
        FormState::default()
    );
}

#[tokio::test]
async fn toggling_boolean_twice_restores_value() {
    let controller = FormController::new(Arc::new(ScriptedService::default()));

    controller.toggle_boolean(BooleanField::Parking).await;
    assert_eq!(controller.snapshot().await.form.parking, "1");
    controller.toggle_boolean(BooleanField::Parking).await;
    assert_eq!(controller.snapshot().await.form.parking, "0");

    controller.set_boolean(BooleanField::Lift, true).await;
    controller.toggle_boolean(BooleanField::Lift).await;
    controller.toggle_boolean(BooleanField::Lift).await;
    assert_eq!(controller.snapshot().await.form.lift, "1");
}

#[tokio::test]
async fn successful_submit_stores_prediction() {
    let service = Arc::new(ScriptedService::default());
    service
        .reply("nerul", Ok(PredictionResponse::new(8_500_000.0)))
        .await;
    let controller = FormController::new(service.clone());
    fill_form(&controller, "Nerul").await;
    controller.set_boolean(BooleanField::Parking, true).await;

    let outcome = controller.submit().await;
    assert_eq!(
        outcome,
        SubmitOutcome::Predicted(PredictionResult {
            predicted_price: 8_500_000.0,
            currency: "INR".into(),
        })
    );

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.phase, SubmissionPhase::Succeeded);
    assert!(!snapshot.in_flight);
    assert_eq!(snapshot.error, None);
    assert_eq!(
        snapshot.prediction.map(|p| p.predicted_price),
        Some(8_500_000.0)
    );

    let seen = service.seen.lock().await;
    assert_eq!(
        seen.as_slice(),
        &[RequestPayload {
            location: "nerul".into(),
            area_sqft: 1000.0,
            bhk: 2.0,
            bathrooms: 2.0,
            age_of_property: 0.0,
            parking: Some(1),
            lift: Some(0),
        }]
    );
}

#[tokio::test]
async fn http_error_body_becomes_error_message() {
    let service = Arc::new(ScriptedService::default());
    service
        .reply(
            "vashi",
            Err(PredictionError::Http {
                status: 500,
                body: "model unavailable".into(),
            }),
        )
        .await;
    let controller = FormController::new(service);
    fill_form(&controller, "Vashi").await;

    assert_eq!(
        controller.submit().await,
        SubmitOutcome::Failed("model unavailable".into())
    );
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.phase, SubmissionPhase::Failed);
    assert_eq!(snapshot.error.as_deref(), Some("model unavailable"));
    assert_eq!(snapshot.prediction, None);
    assert!(!snapshot.in_flight);
}

#[tokio::test]
async fn transport_and_malformed_failures_use_fixed_messages() {
    let service = Arc::new(ScriptedService::default());
    service
        .reply("airoli", Err(PredictionError::Transport("connection refused".into())))
        .await;
    service
        .reply(
            "ulwe",
            Err(PredictionError::MalformedResponse(
                "missing field `predicted_price`".into(),
            )),
        )
        .await;
    let controller = FormController::new(service);

    fill_form(&controller, "Airoli").await;
    assert_eq!(
        controller.submit().await,
        SubmitOutcome::Failed(GENERIC_FAILURE_MESSAGE.into())
    );

    controller.update_field(FormField::Location, "Ulwe").await;
    assert_eq!(
        controller.submit().await,
        SubmitOutcome::Failed(MALFORMED_RESPONSE_MESSAGE.into())
    );
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.prediction, None);
    assert!(!snapshot.in_flight);
}

#[tokio::test]
async fn in_flight_only_while_request_is_pending() {
    let service = Arc::new(ScriptedService::default());
    let release_ok = service
        .gated_reply("kharghar", Ok(PredictionResponse::new(6_200_000.0)))
        .await;
    let release_err = service
        .gated_reply(
            "panvel",
            Err(PredictionError::Http {
                status: 422,
                body: "bad input".into(),
            }),
        )
        .await;
    let release_unreachable = service
        .gated_reply(
            "airoli",
            Err(PredictionError::Transport("connection reset".into())),
        )
        .await;
    let controller = FormController::new(service);
    let mut events = controller.subscribe();

    for (location, release) in [
        ("Kharghar", release_ok),
        ("Panvel", release_err),
        ("Airoli", release_unreachable),
    ] {
        fill_form(&controller, location).await;
        assert!(!controller.snapshot().await.in_flight);

        let pending = spawn_submit(&controller);
        wait_for_start(&mut events).await;

        let during = controller.snapshot().await;
        assert!(during.in_flight);
        assert_eq!(during.phase, SubmissionPhase::Submitting);
        assert_eq!(during.prediction, None);
        assert_eq!(during.error, None);

        release.send(()).expect("release reply");
        pending.await.expect("submit task");

        let after = controller.snapshot().await;
        assert!(!after.in_flight);
        assert_exclusive(&after);
        assert!(after.prediction.is_some() || after.error.is_some());
    }
}

#[tokio::test]
async fn new_submission_clears_previous_outcome() {
    let service = Arc::new(ScriptedService::default());
    service
        .reply(
            "ghansoli",
            Err(PredictionError::Http {
                status: 503,
                body: "warming up".into(),
            }),
        )
        .await;
    let release = service
        .gated_reply("nerul", Ok(PredictionResponse::new(7_000_000.0)))
        .await;
    let controller = FormController::new(service);
    let mut events = controller.subscribe();

    fill_form(&controller, "Ghansoli").await;
    controller.submit().await;
    assert_eq!(
        controller.snapshot().await.error.as_deref(),
        Some("warming up")
    );

    controller.update_field(FormField::Location, "Nerul").await;
    let pending = spawn_submit(&controller);
    wait_for_start(&mut events).await;
    let during = controller.snapshot().await;
    assert_eq!(during.error, None);
    assert_eq!(during.prediction, None);

    release.send(()).expect("release reply");
    pending.await.expect("submit task");
    let after = controller.snapshot().await;
    assert_eq!(after.error, None);
    assert_eq!(after.prediction.map(|p| p.predicted_price), Some(7_000_000.0));
}

#[tokio::test]
async fn older_response_never_overwrites_newer_one() {
    let service = Arc::new(ScriptedService::default());
    let release_old = service
        .gated_reply("vashi", Ok(PredictionResponse::new(100.0)))
        .await;
    let release_new = service
        .gated_reply("nerul", Ok(PredictionResponse::new(200.0)))
        .await;
    let controller = FormController::new(service);
    let mut events = controller.subscribe();

    fill_form(&controller, "Vashi").await;
    let first = spawn_submit(&controller);
    assert_eq!(wait_for_start(&mut events).await, 1);

    controller.update_field(FormField::Location, "Nerul").await;
    let second = spawn_submit(&controller);
    assert_eq!(wait_for_start(&mut events).await, 2);

    release_new.send(()).expect("release newer");
    assert_eq!(
        second.await.expect("second submit"),
        SubmitOutcome::Predicted(PredictionResult {
            predicted_price: 200.0,
            currency: "INR".into(),
        })
    );

    release_old.send(()).expect("release older");
    assert_eq!(
        first.await.expect("first submit"),
        SubmitOutcome::Superseded {
            token: 1,
            latest: 2
        }
    );

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.phase, SubmissionPhase::Succeeded);
    assert!(!snapshot.in_flight);
    assert_eq!(snapshot.prediction.map(|p| p.predicted_price), Some(200.0));
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn stale_response_keeps_newer_request_in_flight() {
    let service = Arc::new(ScriptedService::default());
    let release_old = service
        .gated_reply(
            "vashi",
            Err(PredictionError::Http {
                status: 500,
                body: "old failure".into(),
            }),
        )
        .await;
    let release_new = service
        .gated_reply("nerul", Ok(PredictionResponse::new(300.0)))
        .await;
    let controller = FormController::new(service);
    let mut events = controller.subscribe();

    fill_form(&controller, "Vashi").await;
    let first = spawn_submit(&controller);
    wait_for_start(&mut events).await;
    controller.update_field(FormField::Location, "Nerul").await;
    let second = spawn_submit(&controller);
    wait_for_start(&mut events).await;

    release_old.send(()).expect("release older");
    assert!(matches!(
        first.await.expect("first submit"),
        SubmitOutcome::Superseded { .. }
    ));
    assert_eq!(
        events.recv().await.expect("discard event"),
        ControllerEvent::StaleResponseDiscarded {
            token: 1,
            latest: 2
        }
    );

    let during = controller.snapshot().await;
    assert!(during.in_flight);
    assert_eq!(during.error, None);

    release_new.send(()).expect("release newer");
    second.await.expect("second submit");
    let after = controller.snapshot().await;
    assert!(!after.in_flight);
    assert_eq!(after.prediction.map(|p| p.predicted_price), Some(300.0));
}

#[tokio::test]
async fn reset_discards_pending_response() {
    let service = Arc::new(ScriptedService::default());
    let release = service
        .gated_reply("kharghar", Ok(PredictionResponse::new(1.0)))
        .await;
    let controller = FormController::new(service);
    let mut events = controller.subscribe();

    fill_form(&controller, "Kharghar").await;
    let pending = spawn_submit(&controller);
    wait_for_start(&mut events).await;

    controller.reset().await;
    release.send(()).expect("release reply");
    assert!(matches!(
        pending.await.expect("submit task"),
        SubmitOutcome::Superseded { .. }
    ));

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.phase, SubmissionPhase::Idle);
    assert!(!snapshot.in_flight);
    assert_eq!(snapshot.prediction, None);
    assert_eq!(snapshot.form, FormState::default());
}

#[tokio::test]
async fn events_follow_submission_lifecycle() {
    let service = Arc::new(ScriptedService::default());
    service
        .reply("cbd belapur", Ok(PredictionResponse::new(9_100_000.0)))
        .await;
    let controller = FormController::new(service);
    let mut events = controller.subscribe();

    fill_form(&controller, "CBD Belapur").await;
    controller.submit().await;

    match events.recv().await.expect("start event") {
        ControllerEvent::SubmissionStarted { token, payload } => {
            assert_eq!(token, 1);
            assert_eq!(payload.location, "cbd belapur");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(
        events.recv().await.expect("ready event"),
        ControllerEvent::PredictionReady {
            token: 1,
            result: PredictionResult {
                predicted_price: 9_100_000.0,
                currency: "INR".into(),
            },
        }
    );
}

#[tokio::test]
async fn health_check_is_delegated_to_service() {
    let controller = FormController::new(Arc::new(ScriptedService::default()));
    let health = controller.check_health().await.expect("health");
    assert_eq!(health.status, "healthy");
    assert_eq!(controller.snapshot().await.phase, SubmissionPhase::Idle);
}
