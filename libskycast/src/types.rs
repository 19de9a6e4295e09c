//! Core types for Skycast

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A syndication feed to monitor, as configured.
///
/// Identity is the url; the optional title is used to prefix announcements
/// from this feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub url: String,
    pub title: Option<String>,
}

/// A single entry parsed out of a feed snapshot.
///
/// Transient: rebuilt on every poll, never persisted individually.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
}

/// Opaque reference to an uploaded blob.
///
/// Backends store whatever they need to reference the blob later (the
/// Bluesky backend keeps the serialized AT Protocol blob ref, the mock a
/// synthetic id), so the enricher never depends on a platform type.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobHandle(pub serde_json::Value);

/// Uploaded link-preview thumbnail attached to an embed card.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub blob: BlobHandle,
    pub mime_type: String,
    pub size: usize,
}

/// Link-preview card derived from an entry's target page.
///
/// Built fresh per entry and discarded after publishing.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedCard {
    pub uri: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<Thumbnail>,
}

/// One announcement ready to hand to the posting backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub text: String,
    pub langs: Vec<String>,
    pub embed: Option<EmbedCard>,
}

impl Announcement {
    /// Build the announcement text for an entry, prefixed with the feed
    /// title when the source has one.
    pub fn for_entry(source: &FeedSource, entry: &FeedEntry, embed: Option<EmbedCard>) -> Self {
        let text = match &source.title {
            Some(title) => format!("{}: {}\n\n{}", title, entry.title, entry.link),
            None => format!("{}\n\n{}", entry.title, entry.link),
        };

        Self {
            text,
            langs: vec!["en".to_string()],
            embed,
        }
    }
}
