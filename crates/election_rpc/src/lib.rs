use jsonrpsee::core::Error as RpseeError;

pub mod binding;
pub mod rpc;
pub mod transaction;

pub use binding::*;
pub use transaction::*;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("jsonrpsee error: {0}")]
    JsonRpseeError(#[from] RpseeError),

    #[error("invalid url provided: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Other(String),
}
