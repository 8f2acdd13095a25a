use crate::application::ports::ReconcileConfig;
use crate::domain::errors::{DomainError, DomainResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Run `operation`, repeating it exactly once if Keycloak answered with a 5xx.
pub async fn retry_once_on_transient<T, F, Fut>(what: &str, mut operation: F) -> DomainResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    match operation().await {
        Err(e) if e.is_transient() => {
            warn!(operation = what, error = %e, "Transient server error, retrying once");
            operation().await
        }
        other => other,
    }
}

/// Bounded polling for entities that are not yet visible right after a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupRetry {
    /// Attempts after the first one
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for LookupRetry {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(50),
        }
    }
}

impl From<&ReconcileConfig> for LookupRetry {
    fn from(config: &ReconcileConfig) -> Self {
        Self {
            attempts: config.lookup_retry_attempts,
            delay: config.get_lookup_retry_delay(),
        }
    }
}

impl LookupRetry {
    /// Poll `lookup` until it yields a value, failing with `NotFound` once attempts run out.
    ///
    /// Errors from `lookup` itself are returned immediately.
    pub async fn run<T, F, Fut>(
        &self,
        entity_type: &str,
        identifier: &str,
        mut lookup: F,
    ) -> DomainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<Option<T>>>,
    {
        for attempt in 0..=self.attempts {
            if let Some(found) = lookup().await? {
                return Ok(found);
            }
            if attempt < self.attempts {
                debug!(
                    entity_type,
                    identifier,
                    attempt = attempt + 1,
                    "Lookup came back empty, retrying"
                );
                tokio::time::sleep(self.delay).await;
            }
        }

        Err(DomainError::not_found(entity_type, identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let calls = AtomicU32::new(0);
        let result = retry_once_on_transient("delete", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(DomainError::TransientServerError {
                        status: 503,
                        message: String::new(),
                    })
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_transient_failure_is_surfaced() {
        let calls = AtomicU32::new(0);
        let result: DomainResult<()> = retry_once_on_transient("delete", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(DomainError::TransientServerError {
                    status: 500,
                    message: String::new(),
                })
            }
        })
        .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rejected_request_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: DomainResult<()> = retry_once_on_transient("delete", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(DomainError::RemoteRejected {
                    status: 400,
                    message: String::new(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lookup_gives_up_after_configured_attempts() {
        let calls = AtomicU32::new(0);
        let policy = LookupRetry {
            attempts: 3,
            delay: Duration::from_millis(1),
        };

        let result: DomainResult<String> = policy
            .run("Authentication flow", "browser-copy", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            })
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn lookup_returns_once_visible() {
        let calls = AtomicU32::new(0);
        let policy = LookupRetry {
            attempts: 3,
            delay: Duration::from_millis(1),
        };

        let found = policy
            .run("Client scope", "profile", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok((n == 2).then(|| "scope-id".to_string())) }
            })
            .await
            .unwrap();

        assert_eq!(found, "scope-id");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
