// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for the supported EVM chains.
//!
//! This module provides functionality for:
//! - Chain and token tables (Arbitrum, Base, Polygon, Optimism)
//! - Querying native and ERC-20 balances
//! - Encoding ERC-20 calls for batched user operations
//! - Amount conversion and address validation

pub mod address;
pub mod calls;
pub mod client;
pub mod erc20;
pub mod types;
pub mod units;

pub use address::{is_valid_address, parse_address, AddressError};
pub use calls::{to_payloads, Call, CallPayload};
pub use client::{ChainClientError, ChainClients, EvmClient};
pub use types::*;
pub use units::{format_balance, format_fixed, format_units, parse_units, UnitsError};
