//! Logging setup for the Skycast binaries
//!
//! Text output by default; one-JSON-object-per-line when
//! `SKYCAST_LOG_FORMAT=json` is set. Level comes from `RUST_LOG`,
//! `SKYCAST_LOG_LEVEL`, or the daemon's `--verbose` flag.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text output (no colors, for piping)
    Text,
    /// Machine-parseable JSON (one JSON object per line)
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json",
                s
            )),
        }
    }
}

/// Initialize logging for a binary.
///
/// # Panics
///
/// Panics if a subscriber has already been installed.
pub fn init(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose {
        "debug".to_string()
    } else {
        std::env::var("SKYCAST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let format = std::env::var("SKYCAST_LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LogFormat::Text);

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .flatten_event(true)
                .with_target(true)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }
}
