//! Skycast - announce fresh syndication-feed entries to Bluesky
//!
//! This library provides the polling pipeline used by the `sky-send`
//! daemon: conditional feed fetching, publication-window filtering, a
//! persistent duplicate ledger, dual-window rate limiting, link-preview
//! enrichment, and the posting-backend abstraction.

pub mod config;
pub mod enricher;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod ledger;
pub mod logging;
pub mod orchestrator;
pub mod platforms;
pub mod rate_limiter;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::{Config, Credentials};
pub use error::{Result, SkycastError};
pub use ledger::PostedLedger;
pub use orchestrator::Orchestrator;
pub use rate_limiter::RateLimiter;
pub use types::{Announcement, EmbedCard, FeedEntry, FeedSource};
