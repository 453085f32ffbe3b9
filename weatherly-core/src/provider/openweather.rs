use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::DEFAULT_WEATHER_URL,
    model::{CurrentConditions, LocationQuery},
};

use super::{ConditionsProvider, LookupError};

/// Current conditions from the OpenWeather `/weather` endpoint, metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new() -> Self {
        Self::with_client(DEFAULT_WEATHER_URL, Client::new())
    }

    pub fn with_client(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn location_params(query: &LocationQuery) -> Vec<(&'static str, String)> {
        match query {
            LocationQuery::City(name) => vec![("q", name.clone())],
            LocationQuery::Coordinates(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
        }
    }
}

impl Default for OpenWeatherProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    // Coordinates over open water come back without a usable name.
    #[serde(default)]
    name: String,
    #[serde(default)]
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
}

impl From<OwCurrentResponse> for CurrentConditions {
    fn from(parsed: OwCurrentResponse) -> Self {
        let (description, icon) = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| (w.description, w.icon))
            .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

        CurrentConditions {
            city_name: parsed.name,
            temperature_c: parsed.main.temp,
            wind_speed_mps: parsed.wind.speed,
            humidity_pct: parsed.main.humidity,
            pressure_hpa: parsed.main.pressure,
            cloudiness_pct: parsed.clouds.all,
            description,
            icon,
            observation_time: DateTime::<Utc>::from_timestamp(parsed.dt, 0)
                .unwrap_or_else(Utc::now),
        }
    }
}

#[async_trait]
impl ConditionsProvider for OpenWeatherProvider {
    async fn current_conditions(
        &self,
        query: &LocationQuery,
        api_key: &str,
    ) -> Result<CurrentConditions, LookupError> {
        let url = format!("{}/weather", self.base_url);
        debug!(?query, "requesting current conditions");

        let mut params = Self::location_params(query);
        params.push(("appid", api_key.to_string()));
        params.push(("units", "metric".to_string()));

        let res = self.http.get(&url).query(&params).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(LookupError::from_status(status, &body));
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        Ok(parsed.into())
    }
}
