use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanderaError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid constraint schema: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Downstream responded with status {0}")]
    Downstream(u16),
}

pub type Result<T> = std::result::Result<T, PanderaError>;
