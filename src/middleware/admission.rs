use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// Gate in front of the extraction pipeline. Uploads beyond the permit count
/// queue instead of being rejected.
///
/// The permit is owned so it can travel into the blocking task that runs the
/// pipeline; it is released when that task ends, not when the request future
/// is dropped.
pub struct Admission {
    permits: Arc<Semaphore>,
    capacity: usize,
    total: AtomicU64,
    waiting: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionMetrics {
    pub total_requests: u64,
    pub waiting_requests: u64,
    pub available_permits: usize,
    pub capacity: usize,
}

/// Counts one queued request; uncounts it however the wait ends.
struct Waiting<'a>(&'a AtomicU64);

impl<'a> Waiting<'a> {
    fn enter(counter: &'a AtomicU64) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Admission {
    pub fn new(capacity: usize) -> Self {
        info!(max_concurrent_requests = capacity, "Initializing pipeline admission");
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            total: AtomicU64::new(0),
            waiting: AtomicU64::new(0),
        }
    }

    /// Waits for a pipeline slot. Dropping the returned permit frees the slot.
    pub async fn acquire(&self) -> AppResult<OwnedSemaphorePermit> {
        let total_requests = self.total.fetch_add(1, Ordering::Relaxed) + 1;

        let permit = {
            let _waiting = Waiting::enter(&self.waiting);
            self.permits.clone().acquire_owned().await
        }
        .map_err(|_| AppError::service_unavailable("pipeline admission closed"))?;

        debug!(
            total_requests = total_requests,
            available_permits = self.permits.available_permits(),
            "Pipeline permit acquired"
        );
        Ok(permit)
    }

    pub fn metrics(&self) -> AdmissionMetrics {
        AdmissionMetrics {
            total_requests: self.total.load(Ordering::Relaxed),
            waiting_requests: self.waiting.load(Ordering::Relaxed),
            available_permits: self.permits.available_permits(),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn abandoned_waiters_leave_the_queue() {
        let admission = Admission::new(1);
        let _held = admission.acquire().await.unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(50), admission.acquire()).await;
        assert!(waited.is_err());

        let metrics = admission.metrics();
        assert_eq!(metrics.waiting_requests, 0);
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.available_permits, 0);
    }

    #[tokio::test]
    async fn permit_outlives_the_request_in_blocking_work() {
        let admission = Arc::new(Admission::new(1));
        let permit = admission.acquire().await.unwrap();

        let (release, finished) = std::sync::mpsc::channel::<()>();
        let work = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            finished.recv().ok();
        });
        // the request side goes away while the work keeps running
        drop(work);

        assert_eq!(admission.metrics().available_permits, 0);
        let second = tokio::time::timeout(Duration::from_millis(50), admission.acquire()).await;
        assert!(second.is_err());

        release.send(()).unwrap();
        let second = tokio::time::timeout(Duration::from_secs(5), admission.acquire())
            .await
            .expect("slot frees once the blocking work ends")
            .unwrap();
        drop(second);
        assert_eq!(admission.metrics().available_permits, 1);
        assert_eq!(admission.metrics().waiting_requests, 0);
    }
}
