//! Client side of the property price estimator: a form controller that
//! submits property attributes to the prediction service.

pub mod config;
mod controller;
pub mod error;
pub mod service;

pub use config::{load_settings, Settings};
pub use controller::{
    ControllerEvent, ControllerSnapshot, FormController, PredictionResult, SubmissionPhase,
    SubmitOutcome,
};
pub use error::PredictionError;
pub use service::{HttpPredictionService, PredictionService};

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod service_tests;
