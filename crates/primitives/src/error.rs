#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unknown contract method {0}")]
    UnknownMethod(String),

    #[error("invalid address {0}")]
    InvalidAddress(String),

    #[error("invalid transaction status {0}")]
    InvalidStatus(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
