use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use uuid::Uuid;

use crate::utils::error::{BoxOfficeError, Result};

/// Waits at most `timeout` for `mutex`, failing with `ResourceBusy`.
pub async fn acquire<'a, T>(
    mutex: &'a Mutex<T>,
    timeout: Duration,
    resource: &str,
) -> Result<MutexGuard<'a, T>> {
    tokio::time::timeout(timeout, mutex.lock())
        .await
        .map_err(|_| busy(resource))
}

fn busy(resource: &str) -> BoxOfficeError {
    let err = BoxOfficeError::ResourceBusy(resource.to_string());
    err.log();
    err
}

/// One lock per event, serializing every change to that event's seat list
/// together with the ticket records bound to it.
#[derive(Debug)]
pub struct SeatLocks {
    timeout: Duration,
    locks: std::sync::Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SeatLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub async fn lock(&self, event_id: Uuid) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(event_id).or_default())
        };

        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| busy(&format!("seats of event {}", event_id)))
    }

    /// Drops the lock entry of a deleted event.
    ///
    /// A task still queued on the old mutex may then run alongside one that
    /// got a fresh mutex for the same id. Both then find the event gone from
    /// the event store, so neither can change its seat list.
    pub fn forget(&self, event_id: Uuid) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&event_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_lock_on_same_event_times_out() {
        let locks = SeatLocks::new(Duration::from_millis(20));
        let event_id = Uuid::new_v4();

        let _held = locks.lock(event_id).await.unwrap();
        let err = locks.lock(event_id).await.unwrap_err();

        assert!(matches!(err, BoxOfficeError::ResourceBusy(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_locks_on_different_events_are_independent() {
        let locks = SeatLocks::new(Duration::from_millis(20));

        let _first = locks.lock(Uuid::new_v4()).await.unwrap();
        assert!(locks.lock(Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn test_lock_is_reusable_after_release() {
        let locks = SeatLocks::new(Duration::from_millis(20));
        let event_id = Uuid::new_v4();

        drop(locks.lock(event_id).await.unwrap());
        assert!(locks.lock(event_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_forget_hands_out_a_fresh_lock() {
        let locks = SeatLocks::new(Duration::from_millis(20));
        let event_id = Uuid::new_v4();

        let _stale = locks.lock(event_id).await.unwrap();
        locks.forget(event_id);
        assert!(locks.lock(event_id).await.is_ok());
    }
}
