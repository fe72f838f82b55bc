//! Failed-login lockout tracking.
//!
//! Per-client-identifier failure counter with a time-windowed reset:
//! `CLEAN -> COUNTING(n) -> LOCKED -> (window elapses) -> CLEAN`. The record
//! store is an explicit trait so multi-instance deployments can swap the
//! process-local map for a shared cache; the tracker itself does not care.
//!
//! The lockout check runs before any bcrypt work so a locked-out client never
//! costs us hashing time.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One client's failure state.
#[derive(Debug, Clone)]
pub struct LockoutRecord {
    pub failure_count: u32,
    pub last_failure_at: DateTime<Utc>,
}

/// Storage for lockout records, keyed by client identifier (source address).
#[async_trait]
pub trait LockoutStore: Send + Sync {
    async fn get(&self, client_id: &str) -> Option<LockoutRecord>;
    async fn set(&self, client_id: &str, record: LockoutRecord);
    async fn remove(&self, client_id: &str);
    /// Remove records whose last failure predates `cutoff`; returns the count.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> usize;
}

/// Map-backed [`LockoutStore`] for single-process deployments.
#[derive(Default)]
pub struct MemoryLockoutStore {
    inner: Mutex<HashMap<String, LockoutRecord>>,
}

impl MemoryLockoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockoutStore for MemoryLockoutStore {
    async fn get(&self, client_id: &str) -> Option<LockoutRecord> {
        self.inner.lock().await.get(client_id).cloned()
    }

    async fn set(&self, client_id: &str, record: LockoutRecord) {
        self.inner.lock().await.insert(client_id.to_string(), record);
    }

    async fn remove(&self, client_id: &str) {
        self.inner.lock().await.remove(client_id);
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut guard = self.inner.lock().await;
        let before = guard.len();
        guard.retain(|_, record| record.last_failure_at >= cutoff);
        before - guard.len()
    }
}

/// Failure counting and lockout decisions over a [`LockoutStore`].
#[derive(Clone)]
pub struct LockoutTracker {
    store: Arc<dyn LockoutStore>,
    max_attempts: u32,
    window: Duration,
}

impl LockoutTracker {
    pub fn new(store: Arc<dyn LockoutStore>, max_attempts: u32, window_secs: u64) -> Self {
        Self {
            store,
            max_attempts,
            window: Duration::seconds(window_secs as i64),
        }
    }

    /// True iff the client has reached the attempt ceiling and the window has
    /// not yet elapsed since the last failure.
    pub async fn is_locked_out(&self, client_id: &str) -> bool {
        match self.store.get(client_id).await {
            Some(record) => {
                record.failure_count >= self.max_attempts
                    && Utc::now() - record.last_failure_at < self.window
            }
            None => false,
        }
    }

    /// Record one failed attempt, stamping the failure time.
    pub async fn record_failure(&self, client_id: &str) {
        let record = match self.store.get(client_id).await {
            Some(mut record) => {
                record.failure_count += 1;
                record.last_failure_at = Utc::now();
                record
            }
            None => LockoutRecord {
                failure_count: 1,
                last_failure_at: Utc::now(),
            },
        };
        if record.failure_count >= self.max_attempts {
            tracing::warn!(
                client_id = %client_id,
                failure_count = record.failure_count,
                "Client locked out after repeated login failures"
            );
        }
        self.store.set(client_id, record).await;
    }

    /// Clear the record on successful authentication.
    pub async fn clear(&self, client_id: &str) {
        self.store.remove(client_id).await;
    }

    /// Purge records older than the window, bounding memory growth.
    pub async fn sweep(&self) -> usize {
        let purged = self.store.purge_older_than(Utc::now() - self.window).await;
        if purged > 0 {
            tracing::debug!(purged = purged, "Purged stale lockout records");
        }
        purged
    }

    /// Spawn the hourly background sweep.
    pub fn spawn_sweeper(self, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
            // First tick fires immediately; skip it.
            interval.tick().await;
            loop {
                interval.tick().await;
                self.sweep().await;
            }
        })
    }
}
