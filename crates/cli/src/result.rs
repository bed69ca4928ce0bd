use coordinator::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("no subcommand provided")]
    NoSubcommand,

    #[error("unable to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to encode response: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("operation failed with {0}")]
    OperationFailed(ErrorKind),

    #[error("devnet error: {0}")]
    Devnet(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
