use thiserror::Error;

use crate::config::ConfigError;
use crate::neynar::FetchError;
use crate::retry::RetryError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to fetch casts: {0}")]
    Upstream(#[from] RetryError<FetchError>),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Invalid(String),
    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
