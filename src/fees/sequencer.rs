// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request sequencing for estimates that may resolve out of order.
//!
//! Network calls cannot be aborted, so staleness is decided at resolution
//! time: every request takes a monotonically increasing token and a result
//! is applied only if its token is still the latest one issued.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Monotonic token source for one lane of requests.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token, superseding every earlier one.
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }

    /// Supersede every outstanding token without issuing a usable one.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

/// A request's claim on its lane.
#[derive(Debug, Clone)]
pub struct Ticket {
    token: u64,
    sequencer: Arc<RequestSequencer>,
}

impl Ticket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn is_current(&self) -> bool {
        self.sequencer.is_current(self.token)
    }
}

/// Delay-and-supersede queue.
///
/// Each scheduled job waits out the quiet window and runs only if no newer
/// job was scheduled meanwhile. The job receives its [`Ticket`] so it can
/// re-check currency after its own awaits.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    sequencer: Arc<RequestSequencer>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            sequencer: Arc::new(RequestSequencer::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Claim the next token without scheduling anything.
    pub fn ticket(&self) -> Ticket {
        Ticket {
            token: self.sequencer.issue(),
            sequencer: self.sequencer.clone(),
        }
    }

    /// Schedule `job` after the quiet window.
    pub fn schedule<F, Fut>(&self, job: F) -> JoinHandle<()>
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.ticket();
        self.spawn_after_window(ticket, job)
    }

    /// Schedule `job` with a ticket claimed earlier through [`Debouncer::ticket`].
    pub fn spawn_after_window<F, Fut>(&self, ticket: Ticket, job: F) -> JoinHandle<()>
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        tokio::spawn(async move {
            if !window.is_zero() {
                tokio::time::sleep(window).await;
            }
            if !ticket.is_current() {
                tracing::trace!(token = ticket.token(), "debounced request superseded");
                return;
            }
            job(ticket).await;
        })
    }

    /// Supersede everything scheduled or in flight on this lane.
    pub fn cancel(&self) {
        self.sequencer.invalidate();
    }
}
