// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # DeFi Protocol Integrations
//!
//! Calldata builders and read-only queries for the protocols the wallet
//! exposes: Aave V3 lending and Uniswap V3 swaps. Builders return
//! [`Call`](crate::blockchain::Call) batches ready for the
//! chain-abstraction submitter.

pub mod aave;
pub mod uniswap;

use crate::blockchain::{ChainClientError, UnitsError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProtocolError {
    #[error("{protocol} is not deployed on chain {chain_id}")]
    UnsupportedChain { protocol: &'static str, chain_id: u64 },

    #[error("{symbol} is not available on chain {chain_id}")]
    UnsupportedToken { chain_id: u64, symbol: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("unsupported fee tier: {0}")]
    InvalidFeeTier(u32),

    #[error("input and output token must differ")]
    SameToken,

    #[error("quote failed: {0}")]
    Quote(String),

    #[error(transparent)]
    Chain(#[from] ChainClientError),
}

impl From<UnitsError> for ProtocolError {
    fn from(e: UnitsError) -> Self {
        ProtocolError::InvalidAmount(e.to_string())
    }
}
