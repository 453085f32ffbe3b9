//! Input channels. Each one only produces a [`LocationQuery`]; none of them
//! talks to the weather services or touches acquisition state.

use crate::model::LocationQuery;

pub mod geolocation;
pub mod voice;

pub use geolocation::{FixedPosition, GeolocationAdapter, IpLocator, PositionSensor, SensorError};
pub use voice::{
    CommandRecognizer, RecognitionError, SpeechRecognizer, Transcript, VoiceAdapter, VoiceState,
};

/// Typed text is submitted verbatim; emptiness is rejected by the orchestrator.
pub fn text_query(value: &str) -> LocationQuery {
    LocationQuery::City(value.to_string())
}
