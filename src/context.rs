//! Per-call cancellation context.
//!
//! A `CallContext` is a cancellation token plus an optional deadline. Every
//! builder carries one and dispatch consults it before and while writing.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::types::{Config, Error, Result};

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that never expires on its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token, e.g. one owned by the automation that fired.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Fresh context carrying `config.connection.call_timeout`, if set.
    pub fn from_config(config: &Config) -> Self {
        match config.connection.call_timeout {
            Some(timeout) => Self::new().with_timeout(timeout),
            None => Self::new(),
        }
    }

    /// Derived context: cancelled with its parent, cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail fast if the call may no longer proceed.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::cancelled("context cancelled"));
        }
        if self.is_expired() {
            return Err(Error::timeout("context deadline exceeded"));
        }
        Ok(())
    }

    /// Resolves once the context is cancelled or its deadline passes.
    ///
    /// Cancel-safe; meant to be raced against other work in `select!`.
    pub async fn done(&self) -> Error {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Error::cancelled("context cancelled"),
                _ = tokio::time::sleep_until(deadline) => Error::timeout("context deadline exceeded"),
            },
            None => {
                self.token.cancelled().await;
                Error::cancelled("context cancelled")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_passes_check() {
        assert!(CallContext::new().check().is_ok());
    }

    #[test]
    fn test_cancelled_context_fails_check() {
        let ctx = CallContext::new();
        ctx.cancel();
        assert!(matches!(ctx.check(), Err(Error::Cancelled(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_context_fails_check() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(1));
        assert!(ctx.check().is_ok());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(matches!(ctx.check(), Err(Error::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_resolves_on_deadline() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(50));
        let err = ctx.done().await;
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn test_done_resolves_on_cancel() {
        let ctx = CallContext::new();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });
        ctx.cancel();
        assert!(matches!(handle.await.unwrap(), Error::Cancelled(_)));
    }

    #[test]
    fn test_child_follows_parent_but_not_siblings() {
        let parent = CallContext::new();
        let a = parent.child();
        let b = parent.child();

        a.cancel();
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(!parent.is_cancelled());

        parent.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn test_from_config_applies_call_timeout() {
        let mut config = Config::default();
        assert!(CallContext::from_config(&config).deadline().is_none());

        config.connection.call_timeout = Some(Duration::from_secs(5));
        assert!(CallContext::from_config(&config).deadline().is_some());
    }
}
