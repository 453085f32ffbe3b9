use thiserror::Error;

/// Why a query ended in `Failed`. Every variant is terminal for that query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error("Please enter a city name.")]
    EmptyQuery,

    #[error("API key is missing. Please set WEATHERLY_API_KEY or run \"weatherly configure\".")]
    MissingCredential,

    #[error("City not found. Please check the city name.")]
    NotFound,

    #[error("Invalid API key. Please check your API key.")]
    Unauthorized,

    #[error("Failed to fetch weather data. Please try again later.")]
    Unknown,
}

impl AcquisitionError {
    /// The short string shown to the end user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Failures raised by an input channel before the orchestrator is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Unable to retrieve your location.")]
    LocationUnavailable,

    #[error("Voice input is not supported on this device.")]
    VoiceUnavailable,
}

impl ChannelError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
