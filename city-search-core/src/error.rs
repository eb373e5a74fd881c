//! Error types for option loading and coordinate parsing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid loader setup: {0}")]
    Setup(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("City lookup failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed city lookup response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

/// Tag of a [`LoadError`], for callers that only branch on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Setup,
    Network,
    Status,
    MalformedResponse,
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Setup(_) => ErrorKind::Setup,
            Self::Network(_) => ErrorKind::Network,
            Self::Status { .. } => ErrorKind::Status,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }

    /// User-friendly message for the dropdown's empty state.
    pub fn user_message(&self) -> String {
        match self {
            Self::Setup(_) => "City search is not configured correctly.".to_string(),
            Self::Network(_) => "Network error. Check your connection and try again.".to_string(),
            Self::Status { status: 429, .. } => {
                "Too many searches. Please wait a moment and try again.".to_string()
            }
            Self::Status { status, .. } => {
                format!("City search is unavailable (status {status}). Try again.")
            }
            Self::MalformedResponse(_) => "No results. Try again.".to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatesError {
    #[error("Expected \"<latitude> <longitude>\", got {0:?}")]
    Shape(String),

    #[error("Not a finite number: {0:?}")]
    NotANumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed() -> LoadError {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        LoadError::from(err)
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(malformed().kind(), ErrorKind::MalformedResponse);
        assert_eq!(
            LoadError::Status { status: 500, body: String::new() }.kind(),
            ErrorKind::Status
        );
        assert_eq!(LoadError::Setup("x".into()).kind(), ErrorKind::Setup);
    }

    #[test]
    fn user_messages_offer_retry() {
        assert!(malformed().user_message().contains("Try again"));

        let err = LoadError::Status { status: 429, body: String::new() };
        assert!(err.user_message().contains("Too many"));

        let err = LoadError::Status { status: 503, body: String::new() };
        assert!(err.user_message().contains("503"));
    }
}
