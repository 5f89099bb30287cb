// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Chain-Abstraction SDK
//!
//! Boundary to the vendor's account-abstraction service, which owns the
//! chain-abstracted balance (CAB), fee estimation for batched calls and
//! user-operation submission.
//!
//! Every capability is a trait so that callers receive explicit handles
//! (see `AppState`) and tests substitute in-memory implementations.

pub mod client;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::blockchain::Call;

pub use client::CabClient;

/// Fee estimation request for a batch of calls on one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRequest {
    pub chain_id: u64,
    pub calls: Vec<Call>,
    /// Tokens the fee may be repaid with; empty lets the vendor choose.
    pub repay_tokens: Vec<String>,
}

impl FeeRequest {
    pub fn new(chain_id: u64, calls: Vec<Call>) -> Self {
        Self {
            chain_id,
            calls,
            repay_tokens: Vec::new(),
        }
    }
}

/// Vendor fee quote. `estimated_fee` is in USDC base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeQuote {
    pub estimated_fee: U256,
    /// Set when the vendor answered but could not price the operation.
    pub error: Option<String>,
}

/// Submission of a batched user operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendCallsRequest {
    pub account: Address,
    pub chain_id: u64,
    pub calls: Vec<Call>,
}

#[async_trait]
pub trait FeeEstimator: Send + Sync {
    async fn estimate_fees(&self, request: &FeeRequest) -> Result<FeeQuote, CabError>;
}

#[async_trait]
pub trait CabBalanceReader: Send + Sync {
    /// Chain-abstracted USDC balance of `owner`, in base units.
    async fn read_balance(&self, owner: Address) -> Result<U256, CabError>;
}

#[async_trait]
pub trait CallSubmitter: Send + Sync {
    /// Submit the calls; returns the user operation hash.
    async fn send_calls(&self, request: &SendCallsRequest) -> Result<String, CabError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CabError {
    #[error("CAB configuration invalid: {0}")]
    Config(String),

    #[error("CAB request failed: {0}")]
    Request(String),

    #[error("CAB response was invalid: {0}")]
    InvalidResponse(String),
}
