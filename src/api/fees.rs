// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee-aware amount endpoints.
//!
//! Fees are estimated by the chain-abstraction service, multiplied by the
//! configured buffer and rounded up. Only USDC transfers are priced.

use alloy::primitives::{Address, U256};
use axum::{extract::State, Json};

use crate::{
    blockchain::{format_units, parse_address, parse_units, USDC_TOKEN},
    error::ApiError,
    fees::{is_insufficient, TransferContext},
    models::{FeeEstimateRequest, FeeEstimateResponse, MaxAmountRequest, MaxAmountResponse},
    state::AppState,
};

pub(crate) async fn resolve_balance(
    state: &AppState,
    owner: Address,
    balance: Option<&str>,
) -> Result<U256, ApiError> {
    match balance {
        Some(raw) => Ok(parse_units(raw, USDC_TOKEN.decimals)?),
        None => Ok(state.cab_balance.read_balance(owner).await?),
    }
}

/// Compute the largest USDC amount the sender can transfer on a chain.
#[utoipa::path(
    post,
    path = "/v1/fees/max-amount",
    tag = "Fees",
    request_body = MaxAmountRequest,
    responses(
        (status = 200, description = "Base fee and max sendable amount", body = MaxAmountResponse),
        (status = 400, description = "Invalid chain, sender or balance"),
        (status = 502, description = "Fee estimation failed")
    )
)]
pub async fn max_amount(
    State(state): State<AppState>,
    Json(request): Json<MaxAmountRequest>,
) -> Result<Json<MaxAmountResponse>, ApiError> {
    let sender = parse_address(&request.sender)?;
    let ctx = TransferContext::new(request.chain_id, USDC_TOKEN.symbol, sender)?;
    let balance = resolve_balance(&state, sender, request.balance.as_deref()).await?;

    let result = state.fees.max_amount(&ctx, balance).await?;
    let decimals = ctx.token.decimals();
    Ok(Json(MaxAmountResponse {
        chain_id: request.chain_id,
        token: ctx.token.symbol().to_string(),
        balance: format_units(balance, decimals),
        base_fee: format_units(result.buffered_base_fee, decimals),
        max_amount: format_units(result.max_amount, decimals),
        max_amount_raw: result.max_amount.to_string(),
    }))
}

/// Estimate the fee of a USDC transfer and flag insufficient balance.
#[utoipa::path(
    post,
    path = "/v1/fees/estimate",
    tag = "Fees",
    request_body = FeeEstimateRequest,
    responses(
        (status = 200, description = "Buffered transfer fee", body = FeeEstimateResponse),
        (status = 400, description = "Invalid chain, address or amount"),
        (status = 502, description = "Fee estimation failed")
    )
)]
pub async fn estimate_fee(
    State(state): State<AppState>,
    Json(request): Json<FeeEstimateRequest>,
) -> Result<Json<FeeEstimateResponse>, ApiError> {
    let sender = parse_address(&request.sender)?;
    let recipient = parse_address(&request.recipient)
        .map_err(|e| ApiError::bad_request(format!("Invalid recipient: {e}")))?;
    let ctx = TransferContext::new(request.chain_id, USDC_TOKEN.symbol, sender)?;
    let decimals = ctx.token.decimals();
    let amount = parse_units(&request.amount, decimals)?;
    let balance = resolve_balance(&state, sender, request.balance.as_deref()).await?;

    let fee = state.fees.transfer_fee(&ctx, recipient, amount).await?;
    Ok(Json(FeeEstimateResponse {
        chain_id: request.chain_id,
        token: ctx.token.symbol().to_string(),
        amount: format_units(amount, decimals),
        fee: format_units(fee, decimals),
        fee_raw: fee.to_string(),
        balance: format_units(balance, decimals),
        insufficient: is_insufficient(amount, fee, balance),
    }))
}
