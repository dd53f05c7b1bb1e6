use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Plot error: {0}")]
    Plot(String),
}

impl AnalysisError {
    pub fn column_not_found(column: &str) -> Self {
        AnalysisError::InvalidArgument(format!("Column '{}' not found in CSV.", column))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AnalysisError::InvalidArgument(message.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, AnalysisError::InvalidArgument(_))
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
