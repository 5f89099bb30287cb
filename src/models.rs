// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive
//! `ToSchema` for the OpenAPI document. Amounts travel as decimal strings:
//! human-readable token units unless the field name ends in `Raw`.
//!
//! ## Model Categories
//!
//! - **Chains**: supported networks and their tokens
//! - **Balances**: aggregated per-chain balances and the chain-abstracted balance
//! - **Fees**: max sendable amount and transfer fee estimates
//! - **Calls**: batched calldata for transfers, swaps and Aave
//! - **Sessions**: live transfer forms and swap quote feeds

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use uuid::Uuid;

use crate::balances::{ChainBalances, ChainFailure};
use crate::blockchain::{CallPayload, USDC_TOKEN};
use crate::fees::FeePhase;
use crate::protocols::aave::{BestYields, SuppliedPosition, YieldInfo};
use crate::protocols::uniswap::SwapQuote;

fn default_token() -> String {
    USDC_TOKEN.symbol.to_string()
}

// =============================================================================
// Chains
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub chain_id: u64,
    pub name: String,
    pub explorer_url: String,
    pub tokens: Vec<TokenInfo>,
}

// =============================================================================
// Balances
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct BalancesQuery {
    /// Bypass the balance cache.
    #[param(default = false)]
    pub refresh: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalancesResponse {
    pub address: String,
    /// `{ chainId: { symbol: balance } }` for every chain that answered.
    #[schema(value_type = Object)]
    pub balances: BTreeMap<u64, ChainBalances>,
    /// First failure in chain order, if any chain failed.
    pub error: Option<ChainFailure>,
    /// All failed chains, in chain order.
    pub errors: Vec<ChainFailure>,
    /// Whether the answer was served from cache.
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CabBalanceResponse {
    pub address: String,
    pub token: String,
    pub balance: String,
    pub balance_raw: String,
}

// =============================================================================
// Fees
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaxAmountRequest {
    pub chain_id: u64,
    /// Account paying the fee.
    pub sender: String,
    /// USDC balance in token units. Read from the chain-abstraction service when absent.
    pub balance: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaxAmountResponse {
    pub chain_id: u64,
    pub token: String,
    pub balance: String,
    /// Buffered fee of a minimal transfer.
    pub base_fee: String,
    /// `max(0, balance - baseFee)`.
    pub max_amount: String,
    pub max_amount_raw: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimateRequest {
    pub chain_id: u64,
    pub sender: String,
    pub recipient: String,
    pub amount: String,
    /// USDC balance in token units. Read from the chain-abstraction service when absent.
    pub balance: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimateResponse {
    pub chain_id: u64,
    pub token: String,
    pub amount: String,
    /// Buffered fee of this transfer.
    pub fee: String,
    pub fee_raw: String,
    pub balance: String,
    /// `amount + fee > balance`.
    pub insufficient: bool,
}

// =============================================================================
// Calls
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferCallsRequest {
    pub chain_id: u64,
    #[serde(default = "default_token")]
    pub token: String,
    pub recipient: String,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuoteRequest {
    pub chain_id: u64,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    /// Pool fee tier in hundredths of a bip. Defaults to 3000.
    pub fee: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapCallsRequest {
    pub chain_id: u64,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    pub fee: Option<u32>,
    pub recipient: String,
    /// Minimum output in base units. Quoted with slippage tolerance when absent.
    pub amount_out_minimum: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AaveSupplyRequest {
    pub chain_id: u64,
    #[serde(default = "default_token")]
    pub token: String,
    pub amount: String,
    pub on_behalf_of: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AaveWithdrawRequest {
    pub chain_id: u64,
    #[serde(default = "default_token")]
    pub token: String,
    /// Token units, or `"max"` for the whole position.
    pub amount: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AaveMaxSupplyRequest {
    pub chain_id: u64,
    #[serde(default = "default_token")]
    pub token: String,
    pub owner: String,
    /// Balance in token units. Read from the chain-abstraction service when
    /// absent, which only holds USDC.
    pub balance: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AaveMaxSupplyResponse {
    pub chain_id: u64,
    pub token: String,
    pub balance: String,
    /// Balance less 0.1 token, two decimals, never negative.
    pub max_amount: String,
    pub max_amount_raw: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallsResponse {
    pub chain_id: u64,
    /// Calls to submit as one batched operation, in order.
    pub calls: Vec<CallPayload>,
}

// =============================================================================
// Aave
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PositionsResponse {
    pub address: String,
    pub positions: Vec<SuppliedPosition>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YieldsResponse {
    /// Highest supply yield first.
    pub yields: Vec<YieldInfo>,
    pub best: Option<BestYields>,
}

// =============================================================================
// Sessions
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenFeeSessionRequest {
    pub sender: String,
    pub chain_id: Option<u64>,
    /// USDC balance in token units. Read from the chain-abstraction service when absent.
    pub balance: Option<String>,
}

/// Form edits. Absent fields are left unchanged; an empty string clears
/// the recipient or amount.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeeSessionRequest {
    pub chain_id: Option<u64>,
    pub recipient: Option<String>,
    pub amount: Option<String>,
    pub balance: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeeSessionResponse {
    pub id: Uuid,
    pub token: String,
    pub phase: FeePhase,
    pub chain_id: Option<u64>,
    pub recipient: Option<String>,
    pub recipient_error: Option<String>,
    pub amount: Option<String>,
    pub amount_error: Option<String>,
    pub balance: String,
    /// Buffered fee of a minimal transfer, once known.
    pub base_fee: Option<String>,
    pub base_fee_error: Option<String>,
    /// Buffered fee of the entered transfer, once known.
    pub tx_fee: Option<String>,
    pub tx_fee_error: Option<String>,
    pub max_amount: Option<String>,
    /// Unknown while the fee the check runs against is unknown.
    pub insufficient: Option<bool>,
    pub can_submit: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub user_op_hash: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteFeedRequest {
    pub chain_id: u64,
    pub token_in: String,
    pub token_out: String,
    /// Token units. Empty resets the feed.
    pub amount_in: String,
    pub fee: Option<u32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFeedResponse {
    pub id: Uuid,
    /// `idle`, `pending`, `ready` or `failed`.
    pub status: String,
    pub quote: Option<SwapQuote>,
    pub error: Option<String>,
}
