// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Fee-Aware Amounts
//!
//! Computes how much of a balance can be sent once the account-abstraction
//! fee is reserved, and keeps that answer current while a user edits a
//! transfer.
//!
//! - [`FeeCalculator`]: stateless base-fee probe and transfer-fee estimates
//! - [`FeeSession`]: per-form state machine with debounced, sequenced lanes
//! - [`Debouncer`]: delay-and-supersede queue shared with swap quotes

pub mod buffer;
pub mod calculator;
pub mod sequencer;
pub mod session;

pub use buffer::{FeeBuffer, FeeBufferError};
pub use calculator::{
    is_insufficient, max_sendable, FeeCalculator, MaxAmount, TransferContext, PROBE_AMOUNT,
};
pub use sequencer::{Debouncer, RequestSequencer, Ticket};
pub use session::{Estimate, FeePhase, FeeSession, FeeSnapshot, SessionError};

/// Default quiet window before an estimate is requested.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    #[error("fee estimation failed: {0}")]
    EstimationFailure(String),

    #[error("{symbol} is not deployed on chain {chain_id}")]
    UnsupportedToken { chain_id: u64, symbol: String },

    #[error("amount must be greater than zero")]
    ZeroAmount,
}
