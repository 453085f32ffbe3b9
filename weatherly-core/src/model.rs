use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A pair of geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// What an input channel hands to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates(Coordinates),
}

impl LocationQuery {
    pub fn city(name: impl Into<String>) -> Self {
        LocationQuery::City(name.into())
    }

    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        LocationQuery::Coordinates(Coordinates { latitude, longitude })
    }

    /// A city query with nothing but whitespace carries no location.
    pub fn is_empty(&self) -> bool {
        match self {
            LocationQuery::City(name) => name.trim().is_empty(),
            LocationQuery::Coordinates(_) => false,
        }
    }
}

/// Result of the authoritative lookup, in canonical metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city_name: String,
    pub temperature_c: f64,
    pub wind_speed_mps: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub cloudiness_pct: u8,
    pub description: String,
    pub icon: String,
    pub observation_time: DateTime<Utc>,
}

impl CurrentConditions {
    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@4x.png", self.icon)
    }
}

/// Result of the best-effort next-day lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedConditions {
    pub city: String,
    pub date: NaiveDate,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
}

impl PredictedConditions {
    /// Midpoint of the predicted range, still in Celsius.
    pub fn mean_temperature_c(&self) -> f64 {
        (self.temp_min_c + self.temp_max_c) / 2.0
    }
}
