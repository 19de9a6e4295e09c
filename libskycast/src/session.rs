//! Session lifecycle for the posting backend
//!
//! One session marker, re-established lazily: `ensure` is a no-op while
//! the marker is held, and the orchestrator drops the marker whenever a
//! backend call surfaces an authentication failure, so the next cycle
//! logs in again instead of crashing.

use tracing::info;

use crate::config::Credentials;
use crate::error::Result;
use crate::platforms::PostingBackend;
use crate::rate_limiter::RateLimiter;

#[derive(Default)]
pub struct SessionManager {
    active: bool,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log in unless a session marker is already held. Login is an
    /// outbound call and passes the generic rate budget.
    pub async fn ensure(
        &mut self,
        backend: &dyn PostingBackend,
        credentials: &Credentials,
        limiter: &mut RateLimiter,
    ) -> Result<()> {
        if self.active {
            return Ok(());
        }

        limiter.admit(false).await;
        backend.login(credentials).await?;
        self.active = true;
        info!("logged in to posting service");

        Ok(())
    }

    /// Drop the session marker; the next `ensure` re-authenticates.
    pub fn invalidate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use crate::platforms::mock::MockBackend;

    fn credentials() -> Credentials {
        Credentials {
            identifier: "tester.example".to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn limiter() -> RateLimiter {
        RateLimiter::new(&RateLimitConfig::default())
    }

    #[tokio::test]
    async fn ensure_logs_in_only_once() {
        let backend = MockBackend::new();
        let mut session = SessionManager::new();
        let mut limiter = limiter();

        session
            .ensure(&backend, &credentials(), &mut limiter)
            .await
            .unwrap();
        session
            .ensure(&backend, &credentials(), &mut limiter)
            .await
            .unwrap();

        assert_eq!(backend.login_calls(), 1);
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn invalidate_triggers_relogin_on_next_ensure() {
        let backend = MockBackend::new();
        let mut session = SessionManager::new();
        let mut limiter = limiter();

        session
            .ensure(&backend, &credentials(), &mut limiter)
            .await
            .unwrap();
        session.invalidate();
        assert!(!session.is_active());

        session
            .ensure(&backend, &credentials(), &mut limiter)
            .await
            .unwrap();
        assert_eq!(backend.login_calls(), 2);
    }

    #[tokio::test]
    async fn failed_login_leaves_session_inactive() {
        let backend = MockBackend::failing_login();
        let mut session = SessionManager::new();
        let mut limiter = limiter();

        let result = session.ensure(&backend, &credentials(), &mut limiter).await;

        assert!(result.is_err());
        assert!(!session.is_active());
    }
}
