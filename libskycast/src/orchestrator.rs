//! Poll orchestration
//!
//! One cycle walks every configured feed in order: conditional fetch,
//! publication-window filter, embed enrichment, rate-limited publish,
//! ledger update. Feeds are isolated from each other — a failing feed is
//! logged and the cycle moves on. Two signals end a cycle early: a
//! server-side rate limit (retried naturally on the next scheduled cycle)
//! and an authentication failure (session invalidated, re-login is lazy).

use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{Config, Credentials};
use crate::enricher::EmbedEnricher;
use crate::error::{FeedError, PlatformError, Result, SkycastError};
use crate::fetcher::{FeedFetcher, FeedUpdate};
use crate::filter;
use crate::ledger::PostedLedger;
use crate::platforms::PostingBackend;
use crate::rate_limiter::RateLimiter;
use crate::session::SessionManager;
use crate::types::{Announcement, FeedSource};

pub struct Orchestrator {
    feeds: Vec<FeedSource>,
    publication_window: ChronoDuration,
    fetcher: FeedFetcher,
    enricher: EmbedEnricher,
    limiter: RateLimiter,
    ledger: PostedLedger,
    session: SessionManager,
    credentials: Credentials,
    backend: Box<dyn PostingBackend>,
}

impl Orchestrator {
    /// Wire up the pipeline from config. Loads the ledger document once;
    /// failures here are startup-fatal.
    pub fn new(
        config: &Config,
        credentials: Credentials,
        backend: Box<dyn PostingBackend>,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(config.http.fetch_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FeedError::Request)?;

        Ok(Self {
            feeds: config.feeds.clone(),
            publication_window: ChronoDuration::seconds(
                config.poll.publication_window_secs as i64,
            ),
            fetcher: FeedFetcher::new(timeout)?,
            enricher: EmbedEnricher::new(client, config.http.max_thumbnail_bytes),
            limiter: RateLimiter::new(&config.rate_limits),
            ledger: PostedLedger::load(&config.ledger_path(), config.ledger.cap)?,
            session: SessionManager::new(),
            credentials,
            backend,
        })
    }

    /// Run one pass over all feeds. Never returns an error: every failure
    /// mode is handled per the taxonomy and retried naturally on the next
    /// scheduled cycle.
    pub async fn run_cycle(&mut self) {
        if let Err(err) = self
            .session
            .ensure(
                self.backend.as_ref(),
                &self.credentials,
                &mut self.limiter,
            )
            .await
        {
            self.handle_cycle_error(err, None);
            return;
        }

        let feeds = self.feeds.clone();
        for feed in &feeds {
            match self.process_feed(feed).await {
                Ok(0) => debug!(feed = %feed.url, "no new entries"),
                Ok(published) => info!(feed = %feed.url, published, "feed processed"),
                Err(
                    err @ SkycastError::Platform(
                        PlatformError::RateLimit(_) | PlatformError::Authentication(_),
                    ),
                ) => {
                    self.handle_cycle_error(err, Some(feed.url.as_str()));
                    return;
                }
                Err(err) => {
                    error!(feed = %feed.url, "feed processing failed: {}", err);
                }
            }
        }
    }

    /// Rate-limit and authentication signals abort the remainder of the
    /// cycle; everything retries on the next scheduled run.
    fn handle_cycle_error(&mut self, err: SkycastError, feed: Option<&str>) {
        match &err {
            SkycastError::Platform(PlatformError::RateLimit(_)) => {
                warn!(feed, "server rate limit hit, deferring to next cycle: {}", err);
            }
            SkycastError::Platform(PlatformError::Authentication(_)) => {
                self.session.invalidate();
                warn!(feed, "authentication failed, will re-login next cycle: {}", err);
            }
            _ => {
                error!(feed, "cycle error: {}", err);
            }
        }
    }

    /// Process one feed; returns how many entries were announced.
    ///
    /// Each successful publish is recorded in the ledger and persisted
    /// before the next entry is considered, so a failure mid-feed keeps
    /// the progress already made.
    async fn process_feed(&mut self, source: &FeedSource) -> Result<usize> {
        debug!(feed = %source.url, "fetching feed");

        let entries = match self.fetcher.fetch_if_changed(source).await? {
            FeedUpdate::Unchanged => return Ok(0),
            FeedUpdate::Entries(entries) => entries,
        };

        let now = Utc::now();
        let mut published = 0;

        for entry in &entries {
            if !filter::is_eligible(entry, &self.ledger, &source.url, now, self.publication_window)
            {
                continue;
            }

            let card = self
                .enricher
                .build_card(&entry.link, &mut self.limiter, self.backend.as_ref())
                .await;
            let announcement = Announcement::for_entry(source, entry, card);

            self.limiter.admit(true).await;
            let post_id = self.backend.create_post(&announcement).await?;
            info!(feed = %source.url, link = %entry.link, %post_id, "announced entry");

            self.ledger.record(&source.url, &entry.link);
            if let Err(err) = self.ledger.save() {
                // The announcement went out; losing the ledger write only
                // risks a duplicate after a crash, so keep going.
                warn!(feed = %source.url, "failed to persist ledger: {}", err);
            }
            published += 1;
        }

        Ok(published)
    }

    pub fn ledger(&self) -> &PostedLedger {
        &self.ledger
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }
}
