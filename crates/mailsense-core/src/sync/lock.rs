//! Per-user sync serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async mutex per user id.
///
/// Two sync passes for the same user share a mutable resume cursor, so
/// they must not interleave: the second pass could commit a stale
/// cursor over a newer one. Passes for different users are fully
/// independent and run in parallel.
///
/// Entries whose lock is no longer held anywhere are evicted on the
/// next acquire, so the registry stays bounded by the number of users
/// with an in-flight or queued pass.
#[derive(Debug, Clone, Default)]
pub struct SyncLocks {
    inner: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl SyncLocks {
    /// Create an empty lock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a user, waiting for any in-flight pass.
    ///
    /// The guard releases on drop.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry mutex is poisoned.
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let user_lock = {
            #[allow(clippy::unwrap_used)]
            let mut registry = self.inner.lock().unwrap();
            // An entry at strong count 1 is referenced by the registry
            // alone: no guard is held and no acquire is queued on it.
            registry.retain(|id, lock| id == user_id || Arc::strong_count(lock) > 1);
            registry
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        user_lock.lock_owned().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_user_is_serialized() {
        let locks = SyncLocks::new();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let locks = locks.clone();
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("user-1").await;
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_released_entries_are_evicted() {
        let locks = SyncLocks::new();
        {
            let _guard = locks.acquire("user-a").await;
        }

        // user-a's pass is over; acquiring for another user sweeps it.
        let _guard_b = locks.acquire("user-b").await;
        {
            let registry = locks.inner.lock().unwrap();
            assert!(!registry.contains_key("user-a"));
            assert!(registry.contains_key("user-b"));
        }

        // An entry with a live guard survives the sweep.
        let _guard_c = locks.acquire("user-c").await;
        let registry = locks.inner.lock().unwrap();
        assert!(registry.contains_key("user-b"));
        assert!(registry.contains_key("user-c"));
    }

    #[tokio::test]
    async fn test_different_users_run_in_parallel() {
        let locks = SyncLocks::new();

        let guard_a = locks.acquire("user-a").await;
        // A second user's lock must be immediately available while the
        // first is held.
        let guard_b =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire("user-b")).await;
        assert!(guard_b.is_ok());
        drop(guard_a);
    }
}
