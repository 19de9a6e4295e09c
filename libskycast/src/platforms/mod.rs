//! Posting backend abstraction
//!
//! The announcement pipeline talks to the social posting service through
//! this trait only. The real implementation is [`bluesky::BlueskyBackend`];
//! [`mock::MockBackend`] stands in for it in tests.

use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::Result;
use crate::types::{Announcement, BlobHandle};

pub mod bluesky;
// Mock backend is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Interface the pipeline needs from the posting service.
///
/// All three calls are outbound and must be admitted through the rate
/// limiter by the caller: `login` through the generic budget,
/// `create_post` and `upload_blob` through the create budget as well.
///
/// Errors carry the platform taxonomy from [`crate::error::PlatformError`];
/// an `Authentication` error from any call tells the session manager to
/// re-authenticate lazily on next use.
#[async_trait]
pub trait PostingBackend: Send + Sync {
    /// Establish a session with the service.
    async fn login(&self, credentials: &Credentials) -> Result<()>;

    /// Publish one announcement, returning the service's post id.
    async fn create_post(&self, announcement: &Announcement) -> Result<String>;

    /// Upload raw bytes (a link-preview thumbnail) and return an opaque
    /// reference usable in a subsequent `create_post` embed.
    async fn upload_blob(&self, bytes: Vec<u8>, mime_type: &str) -> Result<BlobHandle>;
}
