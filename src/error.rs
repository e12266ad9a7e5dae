use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for AnalyticsError {
    fn from(err: polars::error::PolarsError) -> Self {
        AnalyticsError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
