//! Mock posting backend for tests
//!
//! Shares its recorded state through `Arc` so a test can keep a clone,
//! hand the backend to the orchestrator, and inspect calls afterwards.

use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};

use crate::config::Credentials;
use crate::error::{PlatformError, Result};
use crate::platforms::PostingBackend;
use crate::types::{Announcement, BlobHandle};

#[derive(Clone, Default)]
pub struct MockBackend {
    login_fails: bool,
    next_post_error: Arc<Mutex<Option<PlatformError>>>,
    upload_fails: bool,
    login_calls: Arc<Mutex<usize>>,
    posted: Arc<Mutex<Vec<Announcement>>>,
    uploaded: Arc<Mutex<Vec<(usize, String)>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose login always fails with an authentication error.
    pub fn failing_login() -> Self {
        Self {
            login_fails: true,
            ..Default::default()
        }
    }

    /// A backend whose blob uploads fail (posting still succeeds).
    pub fn failing_uploads() -> Self {
        Self {
            upload_fails: true,
            ..Default::default()
        }
    }

    /// Make the next `create_post` call fail with the given error. The
    /// error is consumed; later posts succeed again.
    pub fn fail_next_post(&self, error: PlatformError) {
        *self.next_post_error.lock().unwrap() = Some(error);
    }

    pub fn login_calls(&self) -> usize {
        *self.login_calls.lock().unwrap()
    }

    pub fn posted(&self) -> Vec<Announcement> {
        self.posted.lock().unwrap().clone()
    }

    /// Uploaded blobs as (size, mime type) pairs.
    pub fn uploaded(&self) -> Vec<(usize, String)> {
        self.uploaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostingBackend for MockBackend {
    async fn login(&self, _credentials: &Credentials) -> Result<()> {
        *self.login_calls.lock().unwrap() += 1;

        if self.login_fails {
            return Err(PlatformError::Authentication("Mock login failed".to_string()).into());
        }
        Ok(())
    }

    async fn create_post(&self, announcement: &Announcement) -> Result<String> {
        if let Some(error) = self.next_post_error.lock().unwrap().take() {
            return Err(error.into());
        }

        self.posted.lock().unwrap().push(announcement.clone());
        Ok(format!("mock-{}", uuid::Uuid::new_v4()))
    }

    async fn upload_blob(&self, bytes: Vec<u8>, mime_type: &str) -> Result<BlobHandle> {
        if self.upload_fails {
            return Err(PlatformError::Posting("Mock upload failed".to_string()).into());
        }

        self.uploaded
            .lock()
            .unwrap()
            .push((bytes.len(), mime_type.to_string()));

        Ok(BlobHandle(json!({
            "ref": uuid::Uuid::new_v4().to_string(),
            "mimeType": mime_type,
            "size": bytes.len(),
        })))
    }
}
