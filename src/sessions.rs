// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Live form sessions held between HTTP requests.
//!
//! Fee sessions and quote feeds keep background estimates running while a
//! client edits a form. The registry bounds how many stay open; the least
//! recently touched one is dropped first, which cancels its pending work.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tracing::debug;
use uuid::Uuid;

/// Default number of open sessions per kind.
pub const DEFAULT_SESSION_CAPACITY: usize = 1_024;

pub struct SessionRegistry<T> {
    kind: &'static str,
    sessions: Mutex<LruCache<Uuid, Arc<T>>>,
}

impl<T> SessionRegistry<T> {
    pub fn new(kind: &'static str, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            kind,
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Register a session, evicting the least recently used one when full.
    pub fn insert(&self, id: Uuid, session: T) -> Arc<T> {
        let session = Arc::new(session);
        if let Ok(mut sessions) = self.sessions.lock() {
            if let Some((evicted, _)) = sessions.push(id, session.clone()) {
                if evicted != id {
                    debug!(kind = self.kind, session = %evicted, "session evicted");
                }
            }
        }
        session
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<T>> {
        self.sessions.lock().ok()?.get(id).cloned()
    }

    pub fn remove(&self, id: &Uuid) -> Option<Arc<T>> {
        self.sessions.lock().ok()?.pop(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
