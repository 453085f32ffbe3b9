//! In-memory providers for unit tests.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use tokio::sync::Notify;

use crate::{
    channel::{RecognitionError, SpeechRecognizer, Transcript},
    model::{CurrentConditions, LocationQuery, PredictedConditions},
    provider::{ConditionsProvider, LookupError, PredictionProvider, Providers},
};

pub(crate) fn conditions(city: &str, temperature_c: f64, wind_speed_mps: f64) -> CurrentConditions {
    CurrentConditions {
        city_name: city.to_string(),
        temperature_c,
        wind_speed_mps,
        humidity_pct: 60,
        pressure_hpa: 1013,
        cloudiness_pct: 40,
        description: "scattered clouds".to_string(),
        icon: "03d".to_string(),
        observation_time: Utc::now(),
    }
}

pub(crate) fn prediction(city: &str, min: f64, max: f64) -> PredictedConditions {
    PredictedConditions {
        city: city.to_string(),
        date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
        temp_min_c: min,
        temp_max_c: max,
    }
}

pub(crate) fn providers(
    conditions: &Arc<FakeConditions>,
    prediction: &Arc<FakePrediction>,
) -> Providers {
    Providers {
        conditions: conditions.clone(),
        prediction: prediction.clone(),
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Ok(CurrentConditions),
    NotFound,
    Unauthorized,
    Status(u16),
}

#[derive(Debug)]
struct Gate {
    key: String,
    started: Arc<Notify>,
    release: Arc<Notify>,
}

/// Answers by city name, or by `"lat,lon"` for coordinate queries. Unknown keys are 404s.
#[derive(Debug, Default)]
pub(crate) struct FakeConditions {
    replies: HashMap<String, Reply>,
    gate: Option<Gate>,
    calls: AtomicUsize,
}

impl FakeConditions {
    pub(crate) fn reply(mut self, key: &str, reply: Reply) -> Self {
        self.replies.insert(key.to_string(), reply);
        self
    }

    /// Signal `started` when `key` is requested, then hold the reply until `release`.
    pub(crate) fn gated(mut self, key: &str, started: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some(Gate {
            key: key.to_string(),
            started,
            release,
        });
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn key(query: &LocationQuery) -> String {
        match query {
            LocationQuery::City(name) => name.clone(),
            LocationQuery::Coordinates(c) => format!("{},{}", c.latitude, c.longitude),
        }
    }
}

#[async_trait]
impl ConditionsProvider for FakeConditions {
    async fn current_conditions(
        &self,
        query: &LocationQuery,
        _api_key: &str,
    ) -> Result<CurrentConditions, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = Self::key(query);

        if let Some(gate) = self.gate.as_ref().filter(|gate| gate.key == key) {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        match self.replies.get(&key).cloned() {
            Some(Reply::Ok(conditions)) => Ok(conditions),
            Some(Reply::Unauthorized) => Err(LookupError::Unauthorized),
            Some(Reply::Status(code)) => Err(LookupError::Status {
                status: code,
                body: String::new(),
            }),
            Some(Reply::NotFound) | None => Err(LookupError::NotFound),
        }
    }
}

/// Answers by city name; unknown cities fail as if the service were down.
#[derive(Debug, Default)]
pub(crate) struct FakePrediction {
    replies: HashMap<String, PredictedConditions>,
    cities: Mutex<Vec<String>>,
}

impl FakePrediction {
    pub(crate) fn reply(mut self, city: &str, predicted: PredictedConditions) -> Self {
        self.replies.insert(city.to_string(), predicted);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.cities().len()
    }

    pub(crate) fn cities(&self) -> Vec<String> {
        self.cities.lock().unwrap().clone()
    }
}

#[async_trait]
impl PredictionProvider for FakePrediction {
    async fn predict_next_day(&self, city: &str) -> Result<PredictedConditions, LookupError> {
        self.cities.lock().unwrap().push(city.to_string());
        self.replies.get(city).cloned().ok_or_else(|| {
            LookupError::from_status(StatusCode::SERVICE_UNAVAILABLE, "prediction service down")
        })
    }
}

/// Returns one scripted result, then reports silence.
#[derive(Debug)]
pub(crate) struct ScriptedRecognizer {
    result: Mutex<Option<Result<Vec<Transcript>, RecognitionError>>>,
}

impl ScriptedRecognizer {
    pub(crate) fn new(result: Result<Vec<Transcript>, RecognitionError>) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(result)),
        })
    }

    pub(crate) fn saying(text: &str) -> Arc<Self> {
        Self::new(Ok(vec![Transcript {
            text: text.to_string(),
            confidence: 0.9,
        }]))
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn recognize(&self) -> Result<Vec<Transcript>, RecognitionError> {
        self.result.lock().unwrap().take().unwrap_or(Err(RecognitionError::NoSpeech))
    }
}
