use serde::{Deserialize, Serialize};

use crate::domain::{parse_leading_float, parse_leading_int, FormState};

pub const PREDICT_PATH: &str = "/api/v1/predict";
pub const HEALTH_PATH: &str = "/api/v1/health";

/// Body of `POST /api/v1/predict`, derived from a [`FormState`] at submit time.
///
/// Unparseable numeric input is kept as `NaN` (or `None` for the flags), which
/// goes out as JSON `null` and is left for the service to reject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestPayload {
    pub location: String,
    pub area_sqft: f64,
    pub bhk: f64,
    pub bathrooms: f64,
    pub age_of_property: f64,
    pub parking: Option<i64>,
    pub lift: Option<i64>,
}

impl RequestPayload {
    pub fn from_form(form: &FormState) -> Self {
        let age_of_property = if form.age_of_property.is_empty() {
            0.0
        } else {
            parse_leading_float(&form.age_of_property)
        };

        Self {
            location: form.location.to_lowercase(),
            area_sqft: parse_leading_float(&form.area_sqft),
            bhk: parse_leading_float(&form.bhk),
            bathrooms: parse_leading_float(&form.bathrooms),
            age_of_property,
            parking: parse_leading_int(&form.parking),
            lift: parse_leading_int(&form.lift),
        }
    }

    pub fn has_unparsed_numbers(&self) -> bool {
        [self.area_sqft, self.bhk, self.bathrooms, self.age_of_property]
            .iter()
            .any(|value| value.is_nan())
            || self.parking.is_none()
            || self.lift.is_none()
    }
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_status() -> String {
    "success".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionResponse {
    pub predicted_price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_status")]
    pub status: String,
}

impl PredictionResponse {
    pub fn new(predicted_price: f64) -> Self {
        Self {
            predicted_price,
            currency: default_currency(),
            status: default_status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
