use thiserror::Error;

/// Top-level error type for the Travel Buddy system.
///
/// Client crates define their own error types (`LlmError`, `PlacesError`);
/// this enum covers the failures that are shared across the workspace,
/// chiefly configuration problems detected at startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TravelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid radius: {value} m is outside {min}..={max} m")]
    RadiusOutOfBounds { value: u32, min: u32, max: u32 },
}

impl From<toml::de::Error> for TravelError {
    fn from(err: toml::de::Error) -> Self {
        TravelError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TravelError {
    fn from(err: toml::ser::Error) -> Self {
        TravelError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TravelError {
    fn from(err: serde_json::Error) -> Self {
        TravelError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Travel Buddy operations.
pub type Result<T> = std::result::Result<T, TravelError>;
