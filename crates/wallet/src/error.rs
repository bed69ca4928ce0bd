use election_rpc::BindingError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The credential is missing, malformed or was refused by the network.
    #[error("signing error: {0}")]
    Signing(String),

    /// The submission could not reach the network.
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<BindingError> for SessionError {
    fn from(err: BindingError) -> Self {
        match err {
            BindingError::Rejected { message, .. } => SessionError::Signing(message),
            BindingError::Unreachable(_)
            | BindingError::Timeout
            | BindingError::Execution(_)
            | BindingError::Rpc(_) => SessionError::Network(err.to_string()),
        }
    }
}
