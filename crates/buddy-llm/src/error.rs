//! Error types for the completion client.

/// Errors from a completion call.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("completion request timed out")]
    Timeout,
    #[error("completion quota exceeded: {0}")]
    RateLimited(String),
    #[error("completion authentication failed: {0}")]
    Auth(String),
    #[error("completion API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
    #[error("invalid completion configuration: {0}")]
    Config(String),
}

impl LlmError {
    /// Whether a single bounded retry may help.
    ///
    /// Quota and auth failures never qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Timeout | LlmError::Transport(_) => true,
            LlmError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Map an unsuccessful HTTP status to an error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => LlmError::RateLimited(message),
            401 | 403 => LlmError::Auth(message),
            408 | 504 => LlmError::Timeout,
            _ => LlmError::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_decode() {
            LlmError::MalformedResponse(err.to_string())
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(LlmError::Timeout.to_string(), "completion request timed out");
        let err = LlmError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "completion API returned 500: boom");
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(
            LlmError::from_status(429, "slow down".into()),
            LlmError::RateLimited(_)
        ));
        assert!(matches!(
            LlmError::from_status(401, "bad key".into()),
            LlmError::Auth(_)
        ));
        assert!(matches!(
            LlmError::from_status(403, "forbidden".into()),
            LlmError::Auth(_)
        ));
        assert!(matches!(
            LlmError::from_status(504, "gateway".into()),
            LlmError::Timeout
        ));
        assert!(matches!(
            LlmError::from_status(400, "bad".into()),
            LlmError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::Transport("reset".into()).is_retryable());
        assert!(LlmError::from_status(502, "bad gateway".into()).is_retryable());
        assert!(!LlmError::from_status(400, "bad".into()).is_retryable());
        assert!(!LlmError::RateLimited("quota".into()).is_retryable());
        assert!(!LlmError::Auth("key".into()).is_retryable());
        assert!(!LlmError::MalformedResponse("junk".into()).is_retryable());
    }
}
