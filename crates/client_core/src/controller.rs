use std::sync::Arc;

use shared::{
    domain::{BooleanField, FormField, FormState},
    protocol::{HealthResponse, PredictionResponse, RequestPayload},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    config::Settings,
    error::PredictionError,
    service::{HttpPredictionService, PredictionService},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub predicted_price: f64,
    pub currency: String,
}

impl From<PredictionResponse> for PredictionResult {
    fn from(value: PredictionResponse) -> Self {
        Self {
            predicted_price: value.predicted_price,
            currency: value.currency,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub form: FormState,
    pub phase: SubmissionPhase,
    pub in_flight: bool,
    pub prediction: Option<PredictionResult>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    SubmissionStarted {
        token: u64,
        payload: RequestPayload,
    },
    PredictionReady {
        token: u64,
        result: PredictionResult,
    },
    SubmissionFailed {
        token: u64,
        message: String,
    },
    StaleResponseDiscarded {
        token: u64,
        latest: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Predicted(PredictionResult),
    Failed(String),
    /// A newer submission (or a reset) was issued before this one settled.
    Superseded { token: u64, latest: u64 },
}

struct ControllerState {
    form: FormState,
    phase: SubmissionPhase,
    in_flight: bool,
    prediction: Option<PredictionResult>,
    error: Option<String>,
    latest_token: u64,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            form: FormState::default(),
            phase: SubmissionPhase::Idle,
            in_flight: false,
            prediction: None,
            error: None,
            latest_token: 0,
        }
    }
}

/// Owns the estimator form and drives one prediction request per submit.
///
/// State is only touched under the lock and the lock is never held across
/// the network call, so submissions may overlap. Each submission gets a
/// request token; a response whose token is no longer the latest is dropped.
pub struct FormController {
    service: Arc<dyn PredictionService>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ControllerEvent>,
}

impl FormController {
    pub fn new(service: Arc<dyn PredictionService>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            service,
            inner: Mutex::new(ControllerState::new()),
            events,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Arc<Self>, PredictionError> {
        let service = HttpPredictionService::new(&settings.api_base_url)?;
        Ok(Self::new(Arc::new(service)))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn update_field(&self, field: FormField, value: impl Into<String>) {
        let mut guard = self.inner.lock().await;
        guard.form.set(field, value);
    }

    pub async fn toggle_boolean(&self, field: BooleanField) {
        let mut guard = self.inner.lock().await;
        guard.form.toggle(field);
    }

    pub async fn set_boolean(&self, field: BooleanField, checked: bool) {
        let mut guard = self.inner.lock().await;
        guard.form.set_checked(field, checked);
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        let guard = self.inner.lock().await;
        ControllerSnapshot {
            form: guard.form.clone(),
            phase: guard.phase,
            in_flight: guard.in_flight,
            prediction: guard.prediction.clone(),
            error: guard.error.clone(),
        }
    }

    /// Restores the initial form. Requests still pending are treated as stale.
    pub async fn reset(&self) {
        let mut guard = self.inner.lock().await;
        let latest_token = guard.latest_token + 1;
        *guard = ControllerState::new();
        guard.latest_token = latest_token;
    }

    pub async fn check_health(&self) -> Result<HealthResponse, PredictionError> {
        self.service.health().await
    }

    /// Sends the current form to the prediction service. Never fails: every
    /// error is turned into the displayed error message.
    pub async fn submit(&self) -> SubmitOutcome {
        let (token, payload) = {
            let mut guard = self.inner.lock().await;
            guard.latest_token += 1;
            guard.in_flight = true;
            guard.phase = SubmissionPhase::Submitting;
            guard.error = None;
            guard.prediction = None;
            (guard.latest_token, RequestPayload::from_form(&guard.form))
        };

        if payload.has_unparsed_numbers() {
            debug!(token, "payload carries unparsed numeric input");
        }
        info!(token, location = %payload.location, "submitting prediction request");
        let _ = self.events.send(ControllerEvent::SubmissionStarted {
            token,
            payload: payload.clone(),
        });

        let result = self.service.predict(&payload).await;

        let mut guard = self.inner.lock().await;
        if guard.latest_token != token {
            let latest = guard.latest_token;
            warn!(token, latest, "discarding response for superseded submission");
            let _ = self
                .events
                .send(ControllerEvent::StaleResponseDiscarded { token, latest });
            return SubmitOutcome::Superseded { token, latest };
        }

        guard.in_flight = false;
        match result {
            Ok(response) => {
                let result = PredictionResult::from(response);
                info!(token, predicted_price = result.predicted_price, "prediction received");
                guard.phase = SubmissionPhase::Succeeded;
                guard.prediction = Some(result.clone());
                let _ = self.events.send(ControllerEvent::PredictionReady {
                    token,
                    result: result.clone(),
                });
                SubmitOutcome::Predicted(result)
            }
            Err(err) => {
                match &err {
                    PredictionError::Http { status, .. } => {
                        warn!(token, status, "prediction service returned an error")
                    }
                    other => error!(token, error = %other, "prediction request failed"),
                }
                let message = err.display_message();
                guard.phase = SubmissionPhase::Failed;
                guard.error = Some(message.clone());
                let _ = self.events.send(ControllerEvent::SubmissionFailed {
                    token,
                    message: message.clone(),
                });
                SubmitOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
