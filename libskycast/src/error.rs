//! Error types for Skycast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SkycastError>;

#[derive(Error, Debug)]
pub enum SkycastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl SkycastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SkycastError::Platform(PlatformError::Authentication(_)) => 2,
            SkycastError::Platform(_) => 1,
            SkycastError::Config(_) => 1,
            SkycastError::Ledger(_) => 1,
            SkycastError::Feed(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("No feeds configured")]
    NoFeeds,
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger document is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Feed returned HTTP {0}")]
    Status(u16),

    #[error("Failed to parse feed: {0}")]
    Parse(String),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_errors_exit_with_code_2() {
        let error =
            SkycastError::Platform(PlatformError::Authentication("expired token".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn other_platform_errors_exit_with_code_1() {
        for platform_error in [
            PlatformError::Posting("record rejected".to_string()),
            PlatformError::Network("connection refused".to_string()),
            PlatformError::RateLimit("too many requests".to_string()),
            PlatformError::Validation("empty text".to_string()),
        ] {
            let error = SkycastError::Platform(platform_error);
            assert_eq!(error.exit_code(), 1);
        }
    }

    #[test]
    fn config_errors_exit_with_code_1() {
        let error = SkycastError::Config(ConfigError::NoFeeds);
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn error_messages_carry_context() {
        let error = SkycastError::Feed(FeedError::Status(502));
        assert_eq!(format!("{}", error), "Feed error: Feed returned HTTP 502");

        let error = SkycastError::Config(ConfigError::MissingCredentials(
            "SKYCAST_IDENTIFIER".to_string(),
        ));
        assert!(format!("{}", error).contains("SKYCAST_IDENTIFIER"));
    }

    #[test]
    fn conversion_from_leaf_errors() {
        let config_error = ConfigError::NoFeeds;
        let error: SkycastError = config_error.into();
        assert!(matches!(error, SkycastError::Config(_)));

        let platform_error = PlatformError::Posting("test".to_string());
        let error: SkycastError = platform_error.into();
        assert!(matches!(error, SkycastError::Platform(_)));
    }
}
