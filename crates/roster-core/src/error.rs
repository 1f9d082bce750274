#![forbid(unsafe_code)]

//! Failure taxonomy for remote collection calls.

use std::fmt;

/// Classified failure of one remote round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The transport could not reach the service.
    NetworkUnavailable,
    /// The service reports the record does not exist.
    NotFound,
    /// The service answered with a descriptive error body.
    ServerMessage(String),
    /// Anything else: unexpected status without text, undecodable body.
    Unknown,
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Operator-facing message for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkUnavailable => {
                "Unable to connect to the server. Please check if the backend is running."
                    .to_string()
            }
            Self::NotFound => "Resource not found.".to_string(),
            Self::ServerMessage(text) => text.clone(),
            Self::Unknown => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    /// Short machine-readable label, used in logs and host bindings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NetworkUnavailable => "network_unavailable",
            Self::NotFound => "not_found",
            Self::ServerMessage(_) => "server_message",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkUnavailable => write!(f, "network unavailable"),
            Self::NotFound => write!(f, "not found"),
            Self::ServerMessage(text) => write!(f, "server error: {text}"),
            Self::Unknown => write!(f, "unknown error"),
        }
    }
}

impl std::error::Error for ClientError {}
