use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{config::DEFAULT_PREDICTION_URL, model::PredictedConditions};

use super::{LookupError, PredictionProvider};

/// Client for the next-day temperature prediction service (`GET /predict?city=`).
#[derive(Debug, Clone)]
pub struct PredictionServiceClient {
    base_url: String,
    http: Client,
}

impl PredictionServiceClient {
    pub fn new() -> Self {
        Self::with_client(DEFAULT_PREDICTION_URL, Client::new())
    }

    pub fn with_client(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }
}

impl Default for PredictionServiceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    date: NaiveDate,
    temp_max: f64,
    temp_min: f64,
    #[serde(default)]
    city: Option<String>,
}

#[async_trait]
impl PredictionProvider for PredictionServiceClient {
    async fn predict_next_day(&self, city: &str) -> Result<PredictedConditions, LookupError> {
        let url = format!("{}/predict", self.base_url);
        debug!(city, "requesting next-day prediction");

        let res = self.http.get(&url).query(&[("city", city)]).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(LookupError::from_status(status, &body));
        }

        let parsed: PredictionResponse = serde_json::from_str(&body)?;

        Ok(PredictedConditions {
            city: parsed.city.unwrap_or_else(|| city.to_string()),
            date: parsed.date,
            temp_min_c: parsed.temp_min,
            temp_max_c: parsed.temp_max,
        })
    }
}
