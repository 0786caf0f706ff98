//! Error types for SendNews.

use thiserror::Error;

/// Common error type for SendNews.
#[derive(Error, Debug)]
pub enum RelayError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The subscriber store could not be written.
    ///
    /// Never swallowed: a lost subscriber can only come back by re-subscribing.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Feed fetch or parse error.
    #[error("feed error: {0}")]
    Feed(String),

    /// Telegram Bot API error.
    #[error("telegram error: {0}")]
    Telegram(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for configuration or user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Process restart failed.
    #[error("restart error: {0}")]
    Restart(String),
}

/// Result type alias for SendNews operations.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_error_display() {
        let err = RelayError::Persistence("disk full".to_string());
        assert_eq!(err.to_string(), "persistence error: disk full");
    }

    #[test]
    fn test_feed_error_display() {
        let err = RelayError::Feed("feed parsing failed".to_string());
        assert_eq!(err.to_string(), "feed error: feed parsing failed");
    }

    #[test]
    fn test_telegram_error_display() {
        let err = RelayError::Telegram("Unauthorized".to_string());
        assert_eq!(err.to_string(), "telegram error: Unauthorized");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RelayError = io_err.into();
        assert!(matches!(err, RelayError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(RelayError::Validation("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
