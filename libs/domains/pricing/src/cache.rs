//! Regional pricing cache.
//!
//! One instance per priced service. The region map is held behind an `Arc`
//! and swapped wholesale under the write lock, so a reader holds either the
//! previous snapshot or the new one, never a mix.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::borrow::Borrow;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{PricingError, PricingResult};
use crate::models::RegionMap;

/// Observable state of a cache, for status reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatus {
    pub regions: usize,
    pub entries: usize,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub next_refresh_at: Option<DateTime<Utc>>,
}

struct CacheState<K, V> {
    regions: Arc<RegionMap<K, V>>,
    refreshed_at: Option<DateTime<Utc>>,
    /// `None` until the first successful refresh: an empty cache is always due
    next_refresh_at: Option<DateTime<Utc>>,
    /// Set by a failed refresh; nothing is due before it
    retry_at: Option<DateTime<Utc>>,
}

pub struct PricingCache<K, V> {
    state: RwLock<CacheState<K, V>>,
}

impl<K, V> Default for PricingCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PricingCache<K, V> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CacheState {
                regions: Arc::new(RegionMap::new()),
                refreshed_at: None,
                next_refresh_at: None,
                retry_at: None,
            }),
        }
    }

    /// Current snapshot; stays valid (and unchanged) across later replaces
    pub async fn snapshot(&self) -> Arc<RegionMap<K, V>> {
        self.state.read().await.regions.clone()
    }

    /// Swap in a new region map in one step
    pub async fn replace(&self, regions: RegionMap<K, V>) {
        self.state.write().await.regions = Arc::new(regions);
    }

    pub async fn is_due(&self, now: DateTime<Utc>) -> bool {
        let state = self.state.read().await;
        if state.retry_at.is_some_and(|retry| now < retry) {
            return false;
        }
        match state.next_refresh_at {
            Some(next) => now >= next,
            None => true,
        }
    }

    /// Record a failed refresh. Contents stay as they are, but the cache is
    /// not due again until `backoff` has passed.
    pub async fn mark_failed(&self, now: DateTime<Utc>, backoff: Duration) {
        self.state.write().await.retry_at = Some(add_clamped(now, backoff));
    }

    pub async fn mark_refreshed(&self, now: DateTime<Utc>, interval: Duration) {
        let mut state = self.state.write().await;
        Self::mark(&mut state, now, interval);
    }

    /// Replace and mark refreshed under a single write lock
    pub async fn commit(&self, regions: RegionMap<K, V>, now: DateTime<Utc>, interval: Duration) {
        let mut state = self.state.write().await;
        state.regions = Arc::new(regions);
        Self::mark(&mut state, now, interval);
    }

    fn mark(state: &mut CacheState<K, V>, now: DateTime<Utc>, interval: Duration) {
        let next = add_clamped(now, interval);

        // next_refresh_at only moves forward
        if state.next_refresh_at.is_none_or(|current| next > current) {
            state.next_refresh_at = Some(next);
        }
        state.refreshed_at = Some(now);
        state.retry_at = None;
    }

    pub async fn status(&self) -> CacheStatus {
        let state = self.state.read().await;
        CacheStatus {
            regions: state.regions.len(),
            entries: state.regions.values().map(|entries| entries.len()).sum(),
            refreshed_at: state.refreshed_at,
            next_refresh_at: state.next_refresh_at,
        }
    }
}

fn add_clamped(now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|duration| now.checked_add_signed(duration))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl<K, V> PricingCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Look up a price detail.
    ///
    /// Fails with `RegionNotFound` when the region is absent and `KeyNotFound`
    /// when the region is present without the key. Never returns a zero
    /// placeholder for an unpriced key.
    pub async fn get<Q>(&self, region: &str, key: &Q) -> PricingResult<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        let state = self.state.read().await;
        let entries = state
            .regions
            .get(region)
            .ok_or_else(|| PricingError::RegionNotFound(region.to_string()))?;

        entries
            .get(key)
            .cloned()
            .ok_or_else(|| PricingError::key_not_found(region, key))
    }
}
