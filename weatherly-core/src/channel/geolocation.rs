use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::GeolocationConfig,
    error::ChannelError,
    model::{Coordinates, LocationQuery},
};

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("position unavailable: {0}")]
    Unavailable(String),

    #[error("locator request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Device position capability.
#[async_trait]
pub trait PositionSensor: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, SensorError>;
}

/// Geolocation channel. A missing sensor disables it for the whole session.
#[derive(Debug, Clone, Default)]
pub struct GeolocationAdapter {
    sensor: Option<Arc<dyn PositionSensor>>,
}

impl GeolocationAdapter {
    pub fn new(sensor: Option<Arc<dyn PositionSensor>>) -> Self {
        Self { sensor }
    }

    pub fn is_enabled(&self) -> bool {
        self.sensor.is_some()
    }

    pub async fn locate(&self) -> Result<LocationQuery, ChannelError> {
        let Some(sensor) = &self.sensor else {
            return Err(ChannelError::LocationUnavailable);
        };

        match sensor.current_position().await {
            Ok(position) => {
                debug!(?position, "position acquired");
                Ok(LocationQuery::Coordinates(position))
            }
            Err(err) => {
                warn!(error = %err, "unable to determine position");
                Err(ChannelError::LocationUnavailable)
            }
        }
    }
}

/// A position given up front, e.g. from command-line flags.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl PositionSensor for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, SensorError> {
        let Coordinates { latitude, longitude } = self.0;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(SensorError::Unavailable(format!(
                "coordinates out of range: {latitude}, {longitude}"
            )));
        }
        Ok(self.0)
    }
}

/// Approximate position from an ip-api compatible endpoint.
#[derive(Debug, Clone)]
pub struct IpLocator {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl IpLocator {
    pub fn new(url: &str, http: Client) -> Self {
        Self {
            url: url.to_string(),
            http,
        }
    }

    /// `None` when the locator is switched off in config.
    pub fn probe(config: &GeolocationConfig) -> Option<Self> {
        let url = config.url.trim();
        (!url.is_empty()).then(|| Self::new(url, Client::new()))
    }
}

#[async_trait]
impl PositionSensor for IpLocator {
    async fn current_position(&self) -> Result<Coordinates, SensorError> {
        let res = self.http.get(&self.url).send().await?.error_for_status()?;
        let parsed: IpApiResponse = res.json().await?;

        match (parsed.status.as_str(), parsed.lat, parsed.lon) {
            ("success", Some(latitude), Some(longitude)) => Ok(Coordinates { latitude, longitude }),
            _ => Err(SensorError::Unavailable(
                parsed.message.unwrap_or_else(|| format!("locator status {}", parsed.status)),
            )),
        }
    }
}
