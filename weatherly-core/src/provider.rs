use crate::{
    config::Config,
    error::AcquisitionError,
    model::{CurrentConditions, LocationQuery, PredictedConditions},
    provider::{openweather::OpenWeatherProvider, prediction::PredictionServiceClient},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::{fmt::Debug, sync::Arc, time::Duration};
use thiserror::Error;

pub mod openweather;
pub mod prediction;

/// Failure of a single remote lookup, before it is folded into an [`AcquisitionError`].
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("location not found")]
    NotFound,

    #[error("credential rejected")]
    Unauthorized,

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl LookupError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::NOT_FOUND => LookupError::NotFound,
            StatusCode::UNAUTHORIZED => LookupError::Unauthorized,
            other => LookupError::Status {
                status: other.as_u16(),
                body: truncate_body(body),
            },
        }
    }
}

impl From<&LookupError> for AcquisitionError {
    fn from(err: &LookupError) -> Self {
        match err {
            LookupError::NotFound => AcquisitionError::NotFound,
            LookupError::Unauthorized => AcquisitionError::Unauthorized,
            _ => AcquisitionError::Unknown,
        }
    }
}

/// The authoritative current-conditions service.
#[async_trait]
pub trait ConditionsProvider: Send + Sync + Debug {
    async fn current_conditions(
        &self,
        query: &LocationQuery,
        api_key: &str,
    ) -> Result<CurrentConditions, LookupError>;
}

/// The best-effort next-day prediction service.
#[async_trait]
pub trait PredictionProvider: Send + Sync + Debug {
    async fn predict_next_day(&self, city: &str) -> Result<PredictedConditions, LookupError>;
}

/// Both remote collaborators, built from one config.
#[derive(Debug, Clone)]
pub struct Providers {
    pub conditions: Arc<dyn ConditionsProvider>,
    pub prediction: Arc<dyn PredictionProvider>,
}

/// Construct both HTTP clients from config, sharing one connection pool.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Providers> {
    let mut builder = Client::builder();
    if let Some(secs) = config.endpoints.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let http = builder.build()?;

    Ok(Providers {
        conditions: Arc::new(OpenWeatherProvider::with_client(
            &config.endpoints.weather_url,
            http.clone(),
        )),
        prediction: Arc::new(PredictionServiceClient::with_client(
            &config.endpoints.prediction_url,
            http,
        )),
    })
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
