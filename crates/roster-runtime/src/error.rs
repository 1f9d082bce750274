#![forbid(unsafe_code)]

//! Coordinator-level failures.

use std::fmt;

use roster_core::{ClientError, RecordId};

/// Flat failure taxonomy as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkUnavailable,
    NotFound,
    ServerMessage,
    Unknown,
    InvalidLocalState,
}

/// Why a coordinator operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The remote call failed.
    Client(ClientError),
    /// The operation names a record absent from the cached collection; no
    /// request was sent.
    InvalidLocalState { id: RecordId },
}

pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Client(ClientError::NetworkUnavailable) => ErrorKind::NetworkUnavailable,
            Self::Client(ClientError::NotFound) => ErrorKind::NotFound,
            Self::Client(ClientError::ServerMessage(_)) => ErrorKind::ServerMessage,
            Self::Client(ClientError::Unknown) => ErrorKind::Unknown,
            Self::InvalidLocalState { .. } => ErrorKind::InvalidLocalState,
        }
    }

    /// Operator-facing message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(err) => err.user_message(),
            Self::InvalidLocalState { id } => {
                format!("Customer {id} is not in the current list. Refresh and try again.")
            }
        }
    }

    /// The underlying client error, if any.
    #[must_use]
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Client(err) => Some(err),
            Self::InvalidLocalState { .. } => None,
        }
    }
}

impl From<ClientError> for SyncError {
    fn from(err: ClientError) -> Self {
        Self::Client(err)
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client(err) => write!(f, "{err}"),
            Self::InvalidLocalState { id } => write!(f, "record {id} is not in the cached collection"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Client(err) => Some(err),
            Self::InvalidLocalState { .. } => None,
        }
    }
}
