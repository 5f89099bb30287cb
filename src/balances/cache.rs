// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for aggregated balance lookups.
//!
//! Holds the latest aggregate per owner address for a short TTL so that
//! repeated page loads do not fan out to four RPC endpoints each time.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use lru::LruCache;

use super::AggregatedBalances;

/// Default time-to-live for a cached aggregate.
pub const DEFAULT_BALANCE_TTL: Duration = Duration::from_secs(30);

struct CacheEntry {
    balances: AggregatedBalances,
    inserted_at: Instant,
}

/// In-process LRU cache keyed by owner address.
pub struct BalanceCache {
    cache: Mutex<LruCache<Address, CacheEntry>>,
    ttl: Duration,
}

impl BalanceCache {
    /// Create a cache holding at most `capacity` owners for `ttl` each.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Cached aggregate for `owner`, or `None` when absent or expired.
    pub fn get(&self, owner: &Address) -> Option<AggregatedBalances> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(owner) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.balances.clone());
            }
            cache.pop(owner);
        }
        None
    }

    /// Store an aggregate. Partial results (any chain errored) are not
    /// cached so the next request retries the failed chains.
    pub fn put(&self, owner: Address, balances: &AggregatedBalances) {
        if balances.error().is_some() {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                owner,
                CacheEntry {
                    balances: balances.clone(),
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    pub fn invalidate(&self, owner: &Address) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(owner);
        }
    }
}
