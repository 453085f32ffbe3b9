//! Conversion from canonical metric values to display units.
//!
//! Nothing here rounds. Formatting to one decimal place happens in
//! [`crate::session::WeatherView`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindSpeedUnit {
    #[default]
    MetersPerSecond,
    KilometersPerHour,
}

impl WindSpeedUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            WindSpeedUnit::MetersPerSecond => "m/s",
            WindSpeedUnit::KilometersPerHour => "km/h",
        }
    }
}

/// User-selected units. Changing these never triggers a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayPreferences {
    pub temperature: TemperatureUnit,
    pub wind_speed: WindSpeedUnit,
}

pub fn to_display_temperature(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
    }
}

pub fn to_display_wind_speed(meters_per_second: f64, unit: WindSpeedUnit) -> f64 {
    match unit {
        WindSpeedUnit::MetersPerSecond => meters_per_second,
        WindSpeedUnit::KilometersPerHour => meters_per_second * 3.6,
    }
}

/// Tomorrow's estimate: mean of the predicted range, then converted.
pub fn to_display_predicted_temperature(min_c: f64, max_c: f64, unit: TemperatureUnit) -> f64 {
    to_display_temperature((min_c + max_c) / 2.0, unit)
}
