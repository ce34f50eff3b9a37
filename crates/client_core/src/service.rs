use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{
    HealthResponse, PredictionResponse, RequestPayload, HEALTH_PATH, PREDICT_PATH,
};
use tracing::{debug, warn};
use url::Url;

use crate::error::PredictionError;

/// The remote model that turns a payload into a price estimate.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(&self, payload: &RequestPayload)
        -> Result<PredictionResponse, PredictionError>;
    async fn health(&self) -> Result<HealthResponse, PredictionError>;
}

pub struct HttpPredictionService {
    http: Client,
    predict_url: Url,
    health_url: Url,
}

impl HttpPredictionService {
    pub fn new(base_url: &str) -> Result<Self, PredictionError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, PredictionError> {
        let base = base_url.trim().trim_end_matches('/');
        let parse = |path: &str| {
            Url::parse(&format!("{base}{path}")).map_err(|source| {
                PredictionError::InvalidBaseUrl {
                    url: base_url.to_string(),
                    source,
                }
            })
        };

        Ok(Self {
            http,
            predict_url: parse(PREDICT_PATH)?,
            health_url: parse(HEALTH_PATH)?,
        })
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }
}

#[async_trait]
impl PredictionService for HttpPredictionService {
    async fn predict(
        &self,
        payload: &RequestPayload,
    ) -> Result<PredictionResponse, PredictionError> {
        debug!(url = %self.predict_url, ?payload, "posting prediction request");
        let res = self
            .http
            .post(self.predict_url.clone())
            .json(payload)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), %body, "prediction request rejected");
            return Err(PredictionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|err| PredictionError::MalformedResponse(err.to_string()))
    }

    async fn health(&self) -> Result<HealthResponse, PredictionError> {
        let res = self.http.get(self.health_url.clone()).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(PredictionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|err| PredictionError::MalformedResponse(err.to_string()))
    }
}
