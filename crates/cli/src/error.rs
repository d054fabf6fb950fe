//! Error types for CLI operations.

use thiserror::Error;

/// Main error type for CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error.
    #[error("File system error: {0}")]
    FileSystem(String),

    /// Analysis error.
    #[error("Analysis error: {0}")]
    Analysis(#[from] chatlens_analysis::error::AnalysisError),

    /// Core error.
    #[error(transparent)]
    Core(#[from] chatlens_core::Error),

    /// Invalid argument error.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
