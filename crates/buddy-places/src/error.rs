//! Error types for place search.

/// Errors from a place search.
#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("location could not be resolved: {0}")]
    InvalidLocation(String),
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
    #[error("place not found: {0}")]
    NotFound(String),
    #[error("place search timed out")]
    Timeout,
    #[error("place search quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("place search authorization failed: {0}")]
    Auth(String),
    #[error("place search API returned {status}: {message}")]
    Api { status: String, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed place search response: {0}")]
    Malformed(String),
    #[error("invalid place search configuration: {0}")]
    Config(String),
}

impl PlacesError {
    /// Whether a single bounded retry may help.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlacesError::Timeout | PlacesError::Transport(_) => true,
            PlacesError::Api { status, .. } => status == "UNKNOWN_ERROR" || status.starts_with('5'),
            _ => false,
        }
    }

    /// Quota and auth failures abort the whole search instead of skipping
    /// one provider type.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PlacesError::QuotaExceeded(_) | PlacesError::Auth(_) | PlacesError::Config(_)
        )
    }

    /// Map a provider `status` field to an error. `None` for OK statuses.
    pub fn from_provider_status(status: &str, message: Option<String>) -> Option<Self> {
        let message = message.unwrap_or_else(|| status.to_string());
        match status {
            "OK" | "ZERO_RESULTS" => None,
            "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Some(PlacesError::QuotaExceeded(message)),
            "REQUEST_DENIED" => Some(PlacesError::Auth(message)),
            "INVALID_REQUEST" => Some(PlacesError::InvalidRequest(message)),
            "NOT_FOUND" => Some(PlacesError::NotFound(message)),
            other => Some(PlacesError::Api {
                status: other.to_string(),
                message,
            }),
        }
    }

    /// Map an unsuccessful HTTP status to an error.
    pub fn from_http_status(status: u16, message: String) -> Self {
        match status {
            429 => PlacesError::QuotaExceeded(message),
            401 | 403 => PlacesError::Auth(message),
            408 | 504 => PlacesError::Timeout,
            _ => PlacesError::Api {
                status: status.to_string(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for PlacesError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PlacesError::Timeout
        } else if err.is_decode() {
            PlacesError::Malformed(err.to_string())
        } else {
            PlacesError::Transport(err.to_string())
        }
    }
}
