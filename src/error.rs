use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Load error: {0}")]
    Load(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::prelude::PolarsError> for AssistantError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        AssistantError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
