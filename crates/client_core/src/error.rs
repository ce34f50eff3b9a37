use thiserror::Error;

/// Shown when a submission fails without a usable message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Prediction service returned an unexpected response.";

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("invalid prediction service url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("prediction service unreachable: {0}")]
    Transport(String),
    #[error("prediction service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("malformed prediction service response: {0}")]
    MalformedResponse(String),
}

impl PredictionError {
    /// Text a form displays for this failure. HTTP error bodies are shown
    /// verbatim; everything else collapses to a fixed message.
    pub fn display_message(&self) -> String {
        match self {
            PredictionError::Http { body, .. } if !body.is_empty() => body.clone(),
            PredictionError::MalformedResponse(_) => MALFORMED_RESPONSE_MESSAGE.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for PredictionError {
    fn from(value: reqwest::Error) -> Self {
        PredictionError::Transport(value.to_string())
    }
}
