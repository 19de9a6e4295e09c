//! Durable record of already-announced links
//!
//! One JSON document mapping feed url to the most recent announced links
//! for that feed, capped per feed with FIFO eviction. Loaded once at
//! startup and rewritten after every successful publish, so a link is
//! never announced twice even across restarts.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use crate::error::{LedgerError, Result};

pub struct PostedLedger {
    path: PathBuf,
    cap: usize,
    entries: HashMap<String, VecDeque<String>>,
}

impl PostedLedger {
    /// Load the ledger document, or start empty when none exists yet.
    pub fn load(path: &Path, cap: usize) -> Result<Self> {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(LedgerError::Serde)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(LedgerError::Io(err).into()),
        };

        Ok(Self {
            path: path.to_path_buf(),
            cap,
            entries,
        })
    }

    /// Whether this link was already announced for this feed.
    ///
    /// Links are compared by exact string match, no normalization.
    pub fn contains(&self, feed_url: &str, link: &str) -> bool {
        self.entries
            .get(feed_url)
            .map(|links| links.iter().any(|l| l == link))
            .unwrap_or(false)
    }

    /// Record a link as announced, evicting the oldest past the cap.
    pub fn record(&mut self, feed_url: &str, link: &str) {
        let links = self.entries.entry(feed_url.to_string()).or_default();
        links.push_back(link.to_string());
        while links.len() > self.cap {
            links.pop_front();
        }
    }

    /// Persist the document, replacing the previous one atomically.
    ///
    /// Written to a sibling temp file first and renamed over the target,
    /// so a crash mid-write cannot corrupt previously persisted state.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(LedgerError::Io)?;
        }

        let json = serde_json::to_string_pretty(&self.entries).map_err(LedgerError::Serde)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(LedgerError::Io)?;
        std::fs::rename(&tmp, &self.path).map_err(LedgerError::Io)?;

        Ok(())
    }

    /// Number of links currently recorded for a feed.
    pub fn len_for(&self, feed_url: &str) -> usize {
        self.entries.get(feed_url).map(|l| l.len()).unwrap_or(0)
    }
}
