//! Configuration management for Skycast

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::types::FeedSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub feeds: Vec<FeedSource>,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds slept between cycles, measured from cycle completion.
    pub interval_secs: u64,
    /// How far back an entry's publication time may lie to be announced.
    pub publication_window_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            publication_window_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub path: String,
    /// Announced links kept per feed; oldest evicted first.
    pub cap: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: "~/.local/share/skycast/posted.json".to_string(),
            cap: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub fetch_timeout_secs: u64,
    pub max_thumbnail_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 10,
            max_thumbnail_bytes: 1_000_000,
        }
    }
}

/// Budgets from Bluesky's published API quotas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub api_budget: u32,
    pub api_window_secs: u64,
    pub create_budget: u32,
    pub create_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            api_budget: 3000,
            api_window_secs: 300,
            create_budget: 1666,
            create_window_secs: 3600,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// An empty feed list is a startup error, not a valid idle state.
    fn validate(&self) -> Result<()> {
        if self.feeds.is_empty() {
            return Err(ConfigError::NoFeeds.into());
        }
        for feed in &self.feeds {
            if feed.url.trim().is_empty() {
                return Err(ConfigError::MissingField("feeds.url".to_string()).into());
            }
        }
        Ok(())
    }

    /// Expanded ledger document path.
    pub fn ledger_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.ledger.path).to_string())
    }
}

/// Posting-service credentials, supplied through the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

impl Credentials {
    /// Read credentials from `SKYCAST_IDENTIFIER` / `SKYCAST_PASSWORD`.
    ///
    /// Missing credentials are fatal at startup.
    pub fn from_env() -> Result<Self> {
        let identifier = std::env::var("SKYCAST_IDENTIFIER")
            .map_err(|_| ConfigError::MissingCredentials("SKYCAST_IDENTIFIER".to_string()))?;
        let password = std::env::var("SKYCAST_PASSWORD")
            .map_err(|_| ConfigError::MissingCredentials("SKYCAST_PASSWORD".to_string()))?;
        Ok(Self {
            identifier,
            password,
        })
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SKYCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("skycast").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkycastError;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_minimal_config_with_defaults() {
        let (_dir, path) = write_config(
            r#"
            [[feeds]]
            url = "https://example.com/rss.xml"
            title = "Example"
            "#,
        );

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.feeds.len(), 1);
        assert_eq!(config.feeds[0].title.as_deref(), Some("Example"));
        assert_eq!(config.poll.interval_secs, 60);
        assert_eq!(config.poll.publication_window_secs, 3600);
        assert_eq!(config.ledger.cap, 20);
        assert_eq!(config.http.max_thumbnail_bytes, 1_000_000);
        assert_eq!(config.rate_limits.api_budget, 3000);
        assert_eq!(config.rate_limits.create_budget, 1666);
    }

    #[test]
    fn feed_title_is_optional() {
        let (_dir, path) = write_config(
            r#"
            [[feeds]]
            url = "https://example.com/rss.xml"
            "#,
        );

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.feeds[0].title, None);
    }

    #[test]
    fn overrides_are_honored() {
        let (_dir, path) = write_config(
            r#"
            [[feeds]]
            url = "https://example.com/rss.xml"

            [poll]
            interval_secs = 120
            publication_window_secs = 1800

            [ledger]
            path = "/tmp/skycast-test/posted.json"
            cap = 5

            [rate_limits]
            api_budget = 10
            api_window_secs = 60
            create_budget = 3
            create_window_secs = 60
            "#,
        );

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.poll.interval_secs, 120);
        assert_eq!(config.ledger.cap, 5);
        assert_eq!(config.rate_limits.create_budget, 3);
    }

    #[test]
    fn empty_feed_list_is_rejected() {
        let (_dir, path) = write_config("feeds = []\n");

        let result = Config::load_from_path(&path);
        assert!(matches!(
            result,
            Err(SkycastError::Config(ConfigError::NoFeeds))
        ));
    }

    #[test]
    fn blank_feed_url_is_rejected() {
        let (_dir, path) = write_config(
            r#"
            [[feeds]]
            url = ""
            "#,
        );

        let result = Config::load_from_path(&path);
        assert!(matches!(
            result,
            Err(SkycastError::Config(ConfigError::MissingField(_)))
        ));
    }

    #[test]
    fn missing_config_file_is_a_read_error() {
        let result = Config::load_from_path(&PathBuf::from("/nonexistent/skycast.toml"));
        assert!(matches!(
            result,
            Err(SkycastError::Config(ConfigError::ReadError(_)))
        ));
    }
}
