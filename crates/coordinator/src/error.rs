use std::fmt;

use primitives::{Fingerprint, TxHash, TxStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wallet::SessionError;

use crate::{ConfirmationError, GuardError};

pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Stable error identifiers handed to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    SigningError,
    NetworkError,
    RevertedError,
    TimeoutError,
    DuplicateSubmissionError,
    QueryError,
    CancelledError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("unable to sign transaction: {0}")]
    Signing(String),

    #[error("network unavailable: {0}")]
    Network(String),

    #[error("transaction {tx_hash} reverted: {}", reason.as_deref().unwrap_or("no reason given"))]
    Reverted {
        tx_hash: TxHash,
        reason: Option<String>,
    },

    #[error("transaction {tx_hash} is still pending")]
    Timeout { tx_hash: TxHash },

    #[error("{}", describe_duplicate(fingerprint, tx_hash.as_ref(), status.as_ref()))]
    DuplicateSubmission {
        fingerprint: Fingerprint,
        tx_hash: Option<TxHash>,
        /// `None` while the first submission has not reached the network yet.
        status: Option<TxStatus>,
    },

    #[error("query failed: {0}")]
    Query(String),

    #[error("operation cancelled")]
    Cancelled,
}

fn describe_duplicate(
    fingerprint: &Fingerprint,
    tx_hash: Option<&TxHash>,
    status: Option<&TxStatus>,
) -> String {
    match (tx_hash, status) {
        (Some(tx_hash), Some(status)) => {
            format!("{fingerprint} was already submitted as {tx_hash} ({status})")
        },
        _ => format!("{fingerprint} is already being submitted"),
    }
}

impl CoordinatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoordinatorError::Signing(_) => ErrorKind::SigningError,
            CoordinatorError::Network(_) => ErrorKind::NetworkError,
            CoordinatorError::Reverted { .. } => ErrorKind::RevertedError,
            CoordinatorError::Timeout { .. } => ErrorKind::TimeoutError,
            CoordinatorError::DuplicateSubmission { .. } => ErrorKind::DuplicateSubmissionError,
            CoordinatorError::Query(_) => ErrorKind::QueryError,
            CoordinatorError::Cancelled => ErrorKind::CancelledError,
        }
    }

    /// Only failures that may not have reached the network are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoordinatorError::Network(_))
    }

    pub fn tx_hash(&self) -> Option<&TxHash> {
        match self {
            CoordinatorError::Reverted { tx_hash, .. } | CoordinatorError::Timeout { tx_hash } => {
                Some(tx_hash)
            },
            CoordinatorError::DuplicateSubmission { tx_hash, .. } => tx_hash.as_ref(),
            _ => None,
        }
    }
}

impl From<SessionError> for CoordinatorError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Signing(msg) | SessionError::InvalidRequest(msg) => {
                CoordinatorError::Signing(msg)
            },
            SessionError::Network(msg) => CoordinatorError::Network(msg),
        }
    }
}

impl From<ConfirmationError> for CoordinatorError {
    fn from(err: ConfirmationError) -> Self {
        match err {
            ConfirmationError::Reverted { tx_hash, reason } => {
                CoordinatorError::Reverted { tx_hash, reason }
            },
            ConfirmationError::Timeout { tx_hash } => CoordinatorError::Timeout { tx_hash },
            ConfirmationError::Cancelled => CoordinatorError::Cancelled,
        }
    }
}

impl From<GuardError> for CoordinatorError {
    fn from(err: GuardError) -> Self {
        CoordinatorError::Query(err.to_string())
    }
}
