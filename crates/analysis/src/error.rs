use thiserror::Error;

/// Errors that can occur during analysis operations.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// AI/ML inference error.
    #[error("AI error: {0}")]
    Ai(String),
    /// Sentiment analysis error.
    #[error("Sentiment analysis error: {0}")]
    Sentiment(String),
    /// Emoji segmentation error.
    #[error("Segmentation error: {0}")]
    Segmentation(String),
    /// Model loading error.
    #[error("Model loading error: {0}")]
    ModelLoading(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
    /// I/O operation error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),
    /// Tokenization error.
    #[error("Tokenization error: {0}")]
    Tokenization(String),
    /// Classifier invocation exceeded the run deadline.
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl From<chatlens_core::Error> for AnalysisError {
    fn from(err: chatlens_core::Error) -> Self {
        match err {
            chatlens_core::Error::Validation(msg) => AnalysisError::Config(msg),
            other => AnalysisError::InvalidInput(other.to_string()),
        }
    }
}

impl From<candle_core::Error> for AnalysisError {
    fn from(err: candle_core::Error) -> Self {
        AnalysisError::Ai(err.to_string())
    }
}

/// Result type alias for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
