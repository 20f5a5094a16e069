//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::Cache;
use crate::error::Result;

// == Cleanup Handle ==
/// Controls a running cleanup task.
///
/// Dropping the handle also stops the task at its next wake-up.
#[derive(Debug)]
pub struct CleanupHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl CleanupHandle {
    /// Signals the task to stop and waits for it to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            // Err means the task already exited
            let _ = shutdown.send(());
        }
        (&mut self.task).await?;
        Ok(())
    }

    /// Stops the task without waiting.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task sleeps for `interval` between runs and takes the cache lock only
/// for the scan itself. A panic during a run is logged and the next run
/// happens on schedule.
///
/// # Example
/// ```ignore
/// let cache = Cache::new(1000, Duration::from_secs(300));
/// let cleanup = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup.shutdown().await?;
/// ```
pub fn spawn_cleanup_task<V>(cache: Cache<V>, interval: Duration) -> CleanupHandle
where
    V: Clone + Send + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = &mut shutdown_rx => break,
            }

            match panic::catch_unwind(AssertUnwindSafe(|| cache.cleanup_expired())) {
                Ok(removed) if removed > 0 => {
                    info!("TTL cleanup: removed {} expired entries", removed);
                }
                Ok(_) => debug!("TTL cleanup: no expired entries found"),
                Err(_) => error!("TTL cleanup run panicked, retrying next interval"),
            }
        }

        info!("TTL cleanup task stopped");
    });

    CleanupHandle {
        shutdown: Some(shutdown_tx),
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    static ARMED: AtomicBool = AtomicBool::new(true);

    /// Value whose first destructor call panics, so dropping it during a
    /// cleanup run blows that run up.
    #[derive(Debug, Clone)]
    struct PanicOnDrop;

    impl Drop for PanicOnDrop {
        fn drop(&mut self) {
            if ARMED.swap(false, Ordering::SeqCst) && !std::thread::panicking() {
                panic!("value destructor failed");
            }
        }
    }

    fn cache() -> Cache<String> {
        Cache::from_store(CacheStore::with_seed(100, Duration::from_secs(300), 23))
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = cache();
        cache.set("expire_soon", "value".to_string(), Some(Duration::from_millis(100)));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(200));

        tokio::time::sleep(Duration::from_millis(500)).await;

        // Gone from the map itself, not just hidden by the read path
        assert!(cache.with_store(|store| store.peek("expire_soon").is_none()));
        let stats = cache.stats();
        assert!(stats.cleanups >= 1);
        assert_eq!(stats.expirations, 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = cache();
        cache.set("long_lived", "value".to_string(), Some(Duration::from_secs(3600)));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(cache.get("long_lived").as_deref(), Some("value"));
        assert!(cache.stats().cleanups >= 2);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_task() {
        let handle = spawn_cleanup_task(cache(), Duration::from_secs(3600));

        // Returns promptly even though the next run is an hour away
        tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .expect("shutdown should not wait for the interval")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(cache(), Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_the_task() {
        let cache = cache();
        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));
        drop(handle);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cache.stats().cleanups, 0);
    }

    #[tokio::test]
    async fn test_panicking_run_does_not_stop_the_task() {
        let cache: Cache<PanicOnDrop> =
            Cache::from_store(CacheStore::with_seed(100, Duration::from_secs(300), 23));
        cache.set("bomb", PanicOnDrop, Some(Duration::from_millis(10)));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(300)).await;

        // One run panicked while dropping the entry; later runs completed
        assert!(!handle.is_finished());
        assert!(cache.is_empty());
        assert!(cache.stats().cleanups >= 2);

        handle.shutdown().await.unwrap();
    }
}
