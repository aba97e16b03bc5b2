//! Error handling for the ATS scorer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScorerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown experience level: {0}")]
    UnknownLevel(String),

    #[error("Reference data error: {0}")]
    ReferenceData(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ScorerError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for ScorerError {
    fn from(err: anyhow::Error) -> Self {
        ScorerError::Processing(format!("{:#}", err))
    }
}

impl ScorerError {
    /// Validation failures are reported to the caller instead of a score.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScorerError::InvalidInput(_) | ScorerError::UnknownRole(_) | ScorerError::UnknownLevel(_)
        )
    }
}
