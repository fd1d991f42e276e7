//! Error types for the conversational core.

use buddy_core::TravelError;

/// Errors returned to callers of the router and session store.
///
/// Client failures are not here: the router converts them into an apology
/// plus an [`ErrorKind`](buddy_core::ErrorKind) tag on the response.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("invalid preference: {0}")]
    InvalidPreference(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<TravelError> for ChatError {
    fn from(err: TravelError) -> Self {
        match err {
            TravelError::RadiusOutOfBounds { .. } => ChatError::InvalidPreference(err.to_string()),
            other => ChatError::StorageError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(
            ChatError::SessionNotFound("abc".to_string()).to_string(),
            "session not found: abc"
        );
        assert_eq!(
            ChatError::ParseError("missing intent".to_string()).to_string(),
            "parse error: missing intent"
        );
    }

    #[test]
    fn test_radius_error_becomes_invalid_preference() {
        let err: ChatError = TravelError::RadiusOutOfBounds {
            value: 500_000,
            min: 100,
            max: 100_000,
        }
        .into();
        assert!(matches!(err, ChatError::InvalidPreference(_)));
        assert!(err.to_string().contains("500000"));
    }

    #[test]
    fn test_other_travel_errors_become_storage() {
        let err: ChatError = TravelError::Serialization("bad".to_string()).into();
        assert!(matches!(err, ChatError::StorageError(_)));
    }
}
