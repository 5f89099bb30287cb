// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Uniswap V3 quote and swap calldata endpoints.

use alloy::primitives::U256;
use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    blockchain::{parse_address, to_payloads},
    error::ApiError,
    models::{CallsResponse, SwapCallsRequest, SwapQuoteRequest},
    protocols::uniswap::{swap_calls as build_swap_calls, SwapParams, SwapQuote, DEFAULT_FEE_TIER},
    state::AppState,
};

/// Quote an exact-input single-pool swap.
#[utoipa::path(
    post,
    path = "/v1/swaps/quote",
    tag = "Swaps",
    request_body = SwapQuoteRequest,
    responses(
        (status = 200, description = "Quoted output", body = SwapQuote),
        (status = 400, description = "Invalid chain, token, fee tier or amount"),
        (status = 502, description = "Quoter call failed")
    )
)]
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<SwapQuoteRequest>,
) -> Result<Json<SwapQuote>, ApiError> {
    let params = SwapParams::new(
        request.chain_id,
        &request.token_in,
        &request.token_out,
        &request.amount_in,
        request.fee.unwrap_or(DEFAULT_FEE_TIER),
    )?;
    Ok(Json(state.quotes.quote(&params).await?))
}

/// Build approve + swap calls. Without `amountOutMinimum` the swap is
/// quoted first and the slippage tolerance applied to the quote.
#[utoipa::path(
    post,
    path = "/v1/swaps/calls",
    tag = "Swaps",
    request_body = SwapCallsRequest,
    responses(
        (status = 200, description = "Approve and swap calls", body = CallsResponse),
        (status = 400, description = "Invalid swap parameters"),
        (status = 502, description = "Quoter call failed")
    )
)]
pub async fn swap_calls(
    State(state): State<AppState>,
    Json(request): Json<SwapCallsRequest>,
) -> Result<Json<CallsResponse>, ApiError> {
    let params = SwapParams::new(
        request.chain_id,
        &request.token_in,
        &request.token_out,
        &request.amount_in,
        request.fee.unwrap_or(DEFAULT_FEE_TIER),
    )?;
    let recipient = parse_address(&request.recipient)?;

    let amount_out_minimum = match request.amount_out_minimum.as_deref() {
        Some(raw) => raw
            .parse::<U256>()
            .map_err(|e| ApiError::bad_request(format!("Invalid amountOutMinimum: {e}")))?,
        None => {
            let quote = state.quotes.quote(&params).await?;
            quote
                .minimum_amount_out
                .parse::<U256>()
                .map_err(|e| ApiError::bad_gateway(format!("Invalid quote: {e}")))?
        }
    };

    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    let calls = build_swap_calls(&params, recipient, amount_out_minimum, now)?;
    Ok(Json(CallsResponse {
        chain_id: request.chain_id,
        calls: to_payloads(&calls),
    }))
}
