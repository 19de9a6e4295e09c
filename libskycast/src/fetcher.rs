//! Conditional feed fetching
//!
//! Carries each feed's last ETag / Last-Modified and sends them back on
//! the next poll, so unchanged feeds short-circuit on HTTP 304 without
//! being re-parsed. The cache lives in process memory only; the first
//! poll after a restart always performs a full fetch.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{FeedError, Result};
use crate::types::{FeedEntry, FeedSource};

/// Outcome of one conditional fetch.
#[derive(Debug)]
pub enum FeedUpdate {
    /// The server reported the feed unchanged since the cached validators.
    Unchanged,
    /// Fresh content, in feed order (typically most recent first).
    Entries(Vec<FeedEntry>),
}

#[derive(Debug, Default)]
struct CacheValidators {
    etag: Option<String>,
    last_modified: Option<String>,
}

pub struct FeedFetcher {
    client: reqwest::Client,
    cache: HashMap<String, CacheValidators>,
}

impl FeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FeedError::Request)?;

        Ok(Self {
            client,
            cache: HashMap::new(),
        })
    }

    /// Fetch a feed, short-circuiting when the server reports it unchanged.
    ///
    /// A 200 response refreshes the cached validators for this feed before
    /// parsing; any non-2xx status other than 304 is a per-feed error.
    pub async fn fetch_if_changed(&mut self, source: &FeedSource) -> Result<FeedUpdate> {
        let mut request = self.client.get(&source.url);
        if let Some(validators) = self.cache.get(&source.url) {
            if let Some(etag) = &validators.etag {
                request = request.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = &validators.last_modified {
                request = request.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let response = request.send().await.map_err(FeedError::Request)?;

        if response.status() == StatusCode::NOT_MODIFIED {
            debug!(feed = %source.url, "feed not modified");
            return Ok(FeedUpdate::Unchanged);
        }
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()).into());
        }

        self.cache.insert(
            source.url.clone(),
            CacheValidators {
                etag: header_value(&response, ETAG),
                last_modified: header_value(&response, LAST_MODIFIED),
            },
        );

        let body = response.bytes().await.map_err(FeedError::Request)?;
        let feed = feed_rs::parser::parse(body.as_ref())
            .map_err(|err| FeedError::Parse(format!("{:?}", err)))?;

        Ok(FeedUpdate::Entries(entries_from(feed)))
    }
}

fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Map a parsed feed to entries, keeping feed order. Entries without a
/// link are dropped; a missing published time falls back to updated,
/// then to now.
fn entries_from(feed: feed_rs::model::Feed) -> Vec<FeedEntry> {
    feed.entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.first()?.href.clone();
            Some(FeedEntry {
                title: entry.title.map_or_else(String::new, |t| t.content),
                link,
                published_at: entry.published.or(entry.updated).unwrap_or_else(Utc::now),
            })
        })
        .collect()
}
