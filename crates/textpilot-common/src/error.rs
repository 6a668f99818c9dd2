use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("relay error: {0}")]
    Relay(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
