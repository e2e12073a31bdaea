use thiserror::Error;

/// Failure of a single weather lookup or of caller-side input validation.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("city '{name}' not found")]
    NotFound { name: String },

    #[error("request to weather provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("weather provider responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode weather provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("city name is empty")]
    EmptyName,
}

impl WeatherError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WeatherError::NotFound { .. })
    }

    /// Short message suitable for showing next to the input that caused it.
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::NotFound { .. } => "City not found",
            WeatherError::EmptyName => "Please enter a city name",
            _ => "An error occurred. Please try again.",
        }
    }
}
