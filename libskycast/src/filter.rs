//! Publication window filter
//!
//! An entry is announced only when it is fresh enough and its link has
//! not already been recorded for its feed.

use chrono::{DateTime, Duration, Utc};

use crate::ledger::PostedLedger;
use crate::types::FeedEntry;

/// Eligible iff `now - published_at <= window` (inclusive at the boundary)
/// and the link is absent from the ledger for this feed.
pub fn is_eligible(
    entry: &FeedEntry,
    ledger: &PostedLedger,
    feed_url: &str,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    entry.published_at >= now - window && !ledger.contains(feed_url, &entry.link)
}
