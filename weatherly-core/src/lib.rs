//! Core library for the `weatherly` app.
//!
//! This crate defines:
//! - Configuration & credential lookup
//! - The two remote collaborators (current conditions, next-day prediction)
//! - The acquisition orchestrator and its last-query-wins state
//! - Input channels (text, voice, geolocation) and unit conversion
//! - A presentation [`Session`] that front ends drive
//!
//! It is used by `weatherly-cli`, but can also be reused by other front ends.

pub mod channel;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod units;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::{AcquisitionError, ChannelError};
pub use model::{Coordinates, CurrentConditions, LocationQuery, PredictedConditions};
pub use orchestrator::{AcquisitionState, Orchestrator, Snapshot};
pub use provider::{ConditionsProvider, PredictionProvider, Providers, providers_from_config};
pub use session::{Session, WeatherView};
pub use units::{DisplayPreferences, TemperatureUnit, WindSpeedUnit};
