//! TTL-based directory cache
//!
//! Wraps a [`DirectorySource`] and serves snapshots from memory while
//! they are fresh. Reads share a read lock; a refresh takes the write
//! lock, calls the source, and replaces the snapshot and its timestamp
//! together or not at all.
//!
//! The freshness check and the refresh are separate critical sections,
//! so under contention several stale callers can each trigger their
//! own refresh. Those refreshes serialize on the write lock and each
//! replaces the state wholesale, which keeps the race wasteful but
//! harmless. Coalescing them into a single in-flight fetch would be a
//! strengthening, not a correctness fix.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use tg_core::{DirectoryError, DirectorySnapshot, DirectorySource};

/// Cheaply clonable handle to a shared directory cache
#[derive(Clone)]
pub struct DirectoryCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    /// Where snapshots come from
    source: Box<dyn DirectorySource>,
    /// How long a snapshot stays fresh; zero means every call fetches
    ttl: Duration,
    /// The published (snapshot, timestamp) pair
    state: RwLock<CacheState>,
}

#[derive(Default)]
struct CacheState {
    snapshot: Option<DirectorySnapshot>,
    refreshed_at: Option<Instant>,
}

impl CacheState {
    /// Return the cached snapshot if it is still within the TTL
    fn fresh(&self, ttl: Duration) -> Option<DirectorySnapshot> {
        match (&self.snapshot, self.refreshed_at) {
            (Some(snapshot), Some(at)) if at.elapsed() < ttl => Some(snapshot.clone()),
            _ => None,
        }
    }
}

impl DirectoryCache {
    /// Create a cache over the given source
    pub fn new(source: impl DirectorySource + 'static, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source: Box::new(source),
                ttl,
                state: RwLock::new(CacheState::default()),
            }),
        }
    }

    /// Return a fresh directory snapshot, refreshing it if the cached
    /// one has expired
    ///
    /// A failed refresh leaves the previously cached state untouched
    /// and surfaces the error to this caller only; the next caller
    /// retries because failure never advances the timestamp.
    pub async fn snapshot(&self) -> Result<DirectorySnapshot, DirectoryError> {
        {
            let state = self.inner.state.read().await;
            if let Some(snapshot) = state.fresh(self.inner.ttl) {
                return Ok(snapshot);
            }
        }

        // Refresh in its own task: the result benefits every waiter,
        // so a request future dropped mid-refresh must not cancel it.
        let inner = Arc::clone(&self.inner);
        match tokio::spawn(async move { inner.refresh().await }).await {
            Ok(result) => result,
            Err(e) => Err(DirectoryError::RefreshTask(e.to_string())),
        }
    }
}

impl CacheInner {
    async fn refresh(&self) -> Result<DirectorySnapshot, DirectoryError> {
        let mut state = self.state.write().await;
        match self.source.fetch().await {
            Ok(snapshot) => {
                tracing::debug!("refreshed tailnet directory: {} peers", snapshot.len());
                state.snapshot = Some(snapshot.clone());
                state.refreshed_at = Some(Instant::now());
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!("failed to refresh tailnet directory: {}", e);
                Err(e)
            }
        }
    }
}
