//! Error types for chatlens core functionality.

use thiserror::Error;

/// Main error type for chatlens.
#[derive(Error, Debug)]
pub enum Error {
    /// File could not be read or written.
    #[error("File system error: {0}")]
    FileSystem(String),
    /// TOML could not be parsed or rendered.
    #[error("Data parsing error: {0}")]
    Parse(String),
    /// Configuration value out of range.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Custom error with message.
    #[error("{0}")]
    Custom(String),
}

/// Result type for chatlens operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Convenience trait for converting errors to core Error type
pub trait IntoCoreError<T> {
    /// Convert to core error with context
    fn with_context(self, context: &str) -> Result<T>;
}

impl<T, E> IntoCoreError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context(self, context: &str) -> Result<T> {
        self.map_err(|e| Error::Custom(format!("{}: {}", context, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_context_prefixes_message() {
        let failed: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = failed.with_context("reading transcript").unwrap_err();
        assert_eq!(err.to_string(), "reading transcript: missing");
    }
}
