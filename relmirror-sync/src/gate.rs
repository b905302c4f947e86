//! Admission gate: a counting semaphore bounding in-flight transfers.
//!
//! One gate per transfer direction. A permit is taken before each network
//! transfer and released when the [`GatePermit`] drops, whatever the outcome.
//! The gate also records how many permits are out and the high-water mark.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::SyncError;

#[derive(Debug)]
struct Counters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Shared, cloneable admission gate.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    name: &'static str,
    limit: usize,
    semaphore: Arc<Semaphore>,
    counters: Arc<Counters>,
}

impl AdmissionGate {
    /// A gate admitting at most `limit` transfers at once (minimum 1).
    pub fn new(name: &'static str, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            name,
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
            counters: Arc::new(Counters {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    /// Wait for a free slot.
    pub async fn admit(&self) -> Result<GatePermit, SyncError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| SyncError::GateClosed(self.name))?;
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);
        Ok(GatePermit {
            counters: Arc::clone(&self.counters),
            _permit: permit,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Transfers currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous permits observed so far.
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

/// A held slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct GatePermit {
    counters: Arc<Counters>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        // Runs before `_permit` is released, so `in_flight` never overshoots.
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::task::JoinSet;

    use super::*;

    #[tokio::test]
    async fn permits_are_counted_and_released() {
        let gate = AdmissionGate::new("test", 2);
        let a = gate.admit().await.unwrap();
        let b = gate.admit().await.unwrap();
        assert_eq!(gate.in_flight(), 2);
        drop(a);
        assert_eq!(gate.in_flight(), 1);
        drop(b);
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.peak(), 2);
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        assert_eq!(AdmissionGate::new("test", 0).limit(), 1);
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn concurrent_holders_never_exceed_limit() {
        let gate = AdmissionGate::new("test", 3);
        let mut tasks = JoinSet::new();
        for i in 0..12u64 {
            let gate = gate.clone();
            tasks.spawn(async move {
                let _permit = gate.admit().await.expect("admit");
                assert!(gate.in_flight() <= 3);
                tokio::time::sleep(Duration::from_millis(10 + i)).await;
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.expect("task");
        }
        assert_eq!(gate.peak(), 3);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn permit_is_released_when_holder_fails() {
        let gate = AdmissionGate::new("test", 1);
        let result: Result<(), &str> = async {
            let _permit = gate.admit().await.unwrap();
            Err("transfer failed")
        }
        .await;
        assert!(result.is_err());
        assert_eq!(gate.in_flight(), 0);
        let _again = gate.admit().await.unwrap();
    }
}
