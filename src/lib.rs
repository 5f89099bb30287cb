// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CAB Wallet - Chain-Abstracted Wallet Service
//!
//! This crate backs a wallet that treats USDC on several EVM chains as one
//! balance. Fees are paid in USDC through an account-abstraction service,
//! so every transfer amount is checked against a buffered fee estimate.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `balances` - Parallel per-chain balance aggregation
//! - `blockchain` - Chain and token tables, RPC clients, ERC-20 calldata
//! - `cab` - Chain-abstraction service client
//! - `fees` - Fee-aware max amount, debounced fee sessions
//! - `protocols` - Uniswap V3 and Aave V3 calldata and queries
//! - `sessions` - Bounded registry of live form sessions
//!
//! ## Live form state
//!
//! [`fees::FeeSession`] and [`protocols::uniswap::QuoteFeed`] keep debounced
//! estimates current while a form is edited. The HTTP API holds them in a
//! [`sessions::SessionRegistry`] under `/v1/fee-sessions` and
//! `/v1/swaps/quote-feeds`; embedders can drive them directly and watch
//! their state through `subscribe`.
//!
//! [`balances::BalanceTracker`] is the library counterpart of the balance
//! endpoint for long-lived views: per-chain loading and error state with
//! `refetch`. The HTTP API answers with one-shot aggregates instead.

pub mod api;
pub mod balances;
pub mod blockchain;
pub mod cab;
pub mod config;
pub mod error;
pub mod fees;
pub mod models;
pub mod protocols;
pub mod sessions;
pub mod state;

use tracing_subscriber::EnvFilter;

use config::{LogFormat, DEFAULT_LOG_FILTER};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
