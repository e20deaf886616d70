//! Per-connection serialization of sync runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};

type SlotMap = HashMap<String, Arc<TokioMutex<()>>>;

/// Keyed registry of in-flight syncs.
///
/// An entry is inserted on the first `acquire` for a key and evicted when the
/// last guard for it drops with no other task waiting. Holders of the same key
/// run one at a time, in lock order.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    slots: Arc<Mutex<SlotMap>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other sync holds `key`, then claims it.
    ///
    /// Cancelling the wait releases the entry like a dropped guard would.
    pub async fn acquire(&self, key: &str) -> InFlightGuard {
        let waiter = Waiter {
            key: key.to_string(),
            slots: Arc::clone(&self.slots),
        };
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(
                slots
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(TokioMutex::new(()))),
            )
        };
        let guard = slot.lock_owned().await;
        InFlightGuard {
            key: key.to_string(),
            slots: Arc::clone(&waiter.slots),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn is_in_flight(&self, key: &str) -> bool {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.contains_key(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Exclusive claim on one key; releases and possibly evicts on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    key: String,
    slots: Arc<Mutex<SlotMap>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl InFlightGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

fn evict_if_idle(slots: &Mutex<SlotMap>, key: &str) {
    let mut slots = slots.lock().unwrap_or_else(|e| e.into_inner());
    let idle = slots
        .get(key)
        .is_some_and(|slot| Arc::strong_count(slot) == 1);
    if idle {
        slots.remove(key);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        // Release the lock before inspecting the count so only the map holds it.
        self.guard.take();
        evict_if_idle(&self.slots, &self.key);
    }
}

/// Lives for the duration of an `acquire`; covers a wait that never completes.
struct Waiter {
    key: String,
    slots: Arc<Mutex<SlotMap>>,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        evict_if_idle(&self.slots, &self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn entry_is_evicted_after_last_guard() {
        let registry = InFlightRegistry::new();
        let guard = registry.acquire("conn-1").await;
        assert!(registry.is_in_flight("conn-1"));
        assert_eq!(guard.key(), "conn-1");
        drop(guard);
        assert!(!registry.is_in_flight("conn-1"));
        assert_eq!(registry.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block_each_other() {
        let registry = InFlightRegistry::new();
        let _held = registry.acquire("conn-1").await;
        let other = tokio::time::timeout(Duration::from_secs(1), registry.acquire("conn-2"))
            .await
            .expect("conn-2 is free");
        assert_eq!(other.key(), "conn-2");
        assert_eq!(registry.in_flight_count(), 2);
    }

    #[tokio::test]
    async fn cancelled_waiter_does_not_leak_entry() {
        let registry = InFlightRegistry::new();
        let holder = registry.acquire("conn-1").await;

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let _guard = registry.acquire("conn-1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(holder);
        waiter.abort();
        let _ = waiter.await;

        assert_eq!(registry.in_flight_count(), 0);
        assert!(!registry.is_in_flight("conn-1"));
    }

    #[tokio::test]
    async fn same_key_holders_never_overlap() {
        let registry = InFlightRegistry::new();
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let registry = registry.clone();
            let active = Arc::clone(&active);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _guard = registry.acquire("conn-1").await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.expect("join");
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(registry.in_flight_count(), 0);
    }
}
