// src/checker/limiter.rs
// =============================================================================
// Politeness limits on in-flight requests.
//
// Two layers of tokio semaphores:
// - one per host (host:port), sized connect_limit_per_host
// - one global, sized max_concurrency
//
// A request takes its host permit first and only then the global one, so a
// request queued behind a busy host does not hold a global slot while it
// waits. Permits are RAII guards, so dropping a RequestPermit frees both
// slots on every exit path, cancellation included.
// =============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::trace;
use url::Url;

use crate::crawl::normalize::host_key;

#[derive(Debug)]
pub struct ConcurrencyLimiter {
    per_host: usize,
    global: Arc<Semaphore>,
    hosts: Mutex<HashMap<String, Arc<Semaphore>>>,
}

/// Proof that a request may go out. Hold it for exactly one attempt.
#[derive(Debug)]
pub struct RequestPermit {
    _host: OwnedSemaphorePermit,
    _global: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    pub fn new(per_host: usize, global: usize) -> Self {
        Self {
            per_host,
            global: Arc::new(Semaphore::new(global)),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    fn host_semaphore(&self, url: &Url) -> Arc<Semaphore> {
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        hosts
            .entry(host_key(url))
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host)))
            .clone()
    }

    /// Waits for a host slot, then a global slot. Fails only if a semaphore
    /// was closed, which the crawler never does.
    pub async fn acquire(&self, url: &Url) -> Result<RequestPermit, AcquireError> {
        let host = self.host_semaphore(url).acquire_owned().await?;
        let global = self.global.clone().acquire_owned().await?;
        trace!(url = %url, "request permit granted");
        Ok(RequestPermit {
            _host: host,
            _global: global,
        })
    }

    #[cfg(test)]
    fn hosts_tracked(&self) -> usize {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[cfg(test)]
    fn available_global(&self) -> usize {
        self.global.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_per_host_cap_never_exceeded() {
        let limiter = Arc::new(ConcurrencyLimiter::new(2, 50));
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let url = Url::parse("https://example.com/").unwrap();

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let limiter = limiter.clone();
            let current = current.clone();
            let peak = peak.clone();
            let url = url.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = limiter.acquire(&url).await.unwrap();
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                current.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(limiter.available_global(), 50);
    }

    #[tokio::test]
    async fn test_hosts_are_independent() {
        let limiter = ConcurrencyLimiter::new(1, 10);
        let a = Url::parse("https://a.example/").unwrap();
        let b = Url::parse("https://b.example/").unwrap();

        let _first = limiter.acquire(&a).await.unwrap();
        // a different host is not blocked by the held permit
        let second = tokio::time::timeout(Duration::from_millis(100), limiter.acquire(&b)).await;
        assert!(second.is_ok());
        assert_eq!(limiter.hosts_tracked(), 2);
    }

    #[tokio::test]
    async fn test_waiting_on_host_does_not_hold_global_slot() {
        let limiter = Arc::new(ConcurrencyLimiter::new(1, 2));
        let busy = Url::parse("https://busy.example/").unwrap();

        let held = limiter.acquire(&busy).await.unwrap();
        assert_eq!(limiter.available_global(), 1);

        let waiter = {
            let limiter = limiter.clone();
            let busy = busy.clone();
            tokio::spawn(async move { limiter.acquire(&busy).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(limiter.available_global(), 1);

        drop(held);
        waiter.await.unwrap().unwrap();
        assert_eq!(limiter.available_global(), 2);
    }
}
