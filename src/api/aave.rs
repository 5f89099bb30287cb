// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Aave V3 lending endpoints.

use alloy::primitives::U256;
use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    blockchain::{
        format_fixed, format_units, parse_address, parse_units, to_payloads, token_deployment,
        TokenDeployment, USDC_TOKEN,
    },
    error::ApiError,
    models::{
        AaveMaxSupplyRequest, AaveMaxSupplyResponse, AaveSupplyRequest, AaveWithdrawRequest,
        CallsResponse, PositionsResponse, YieldsResponse,
    },
    protocols::{
        aave::{best_yields, max_supply, sort_by_supply_yield, supply_calls, withdraw_call},
        ProtocolError,
    },
    state::AppState,
};

fn resolve_token(chain_id: u64, symbol: &str) -> Result<TokenDeployment, ProtocolError> {
    token_deployment(chain_id, symbol).ok_or_else(|| ProtocolError::UnsupportedToken {
        chain_id,
        symbol: symbol.to_string(),
    })
}

/// Build approve + supply calls.
#[utoipa::path(
    post,
    path = "/v1/aave/supply/calls",
    tag = "Aave",
    request_body = AaveSupplyRequest,
    responses(
        (status = 200, description = "Approve and supply calls", body = CallsResponse),
        (status = 400, description = "Invalid chain, token, address or amount")
    )
)]
pub async fn supply(Json(request): Json<AaveSupplyRequest>) -> Result<Json<CallsResponse>, ApiError> {
    let token = resolve_token(request.chain_id, &request.token)?;
    let on_behalf_of = parse_address(&request.on_behalf_of)?;
    let amount = parse_units(&request.amount, token.decimals())?;
    if amount.is_zero() {
        return Err(ApiError::bad_request("Amount must be greater than zero"));
    }

    let calls = supply_calls(token, amount, on_behalf_of)?;
    Ok(Json(CallsResponse {
        chain_id: request.chain_id,
        calls: to_payloads(&calls),
    }))
}

/// Largest amount offered by the supply form's "Max available" action.
#[utoipa::path(
    post,
    path = "/v1/aave/supply/max",
    tag = "Aave",
    request_body = AaveMaxSupplyRequest,
    responses(
        (status = 200, description = "Balance less the supply reserve", body = AaveMaxSupplyResponse),
        (status = 400, description = "Invalid chain, token, address or balance"),
        (status = 502, description = "Balance lookup failed")
    )
)]
pub async fn max_supply_amount(
    State(state): State<AppState>,
    Json(request): Json<AaveMaxSupplyRequest>,
) -> Result<Json<AaveMaxSupplyResponse>, ApiError> {
    let token = resolve_token(request.chain_id, &request.token)?;
    let owner = parse_address(&request.owner)?;
    let decimals = token.decimals();
    let balance = match request.balance.as_deref() {
        Some(raw) => parse_units(raw, decimals)?,
        None if token.symbol() == USDC_TOKEN.symbol => state.cab_balance.read_balance(owner).await?,
        None => {
            return Err(ApiError::bad_request(format!(
                "balance is required for {}",
                token.symbol()
            )))
        }
    };

    let max = max_supply(balance, decimals);
    let max_amount = if max.is_zero() {
        "0".to_string()
    } else {
        format_fixed(max, decimals, 2)
    };
    Ok(Json(AaveMaxSupplyResponse {
        chain_id: request.chain_id,
        token: token.symbol().to_string(),
        balance: format_units(balance, decimals),
        max_amount,
        max_amount_raw: max.to_string(),
    }))
}

/// Build the withdraw call. `amount = "max"` withdraws the whole position.
#[utoipa::path(
    post,
    path = "/v1/aave/withdraw/calls",
    tag = "Aave",
    request_body = AaveWithdrawRequest,
    responses(
        (status = 200, description = "Withdraw call", body = CallsResponse),
        (status = 400, description = "Invalid chain, token, address or amount")
    )
)]
pub async fn withdraw(
    Json(request): Json<AaveWithdrawRequest>,
) -> Result<Json<CallsResponse>, ApiError> {
    let token = resolve_token(request.chain_id, &request.token)?;
    let to = parse_address(&request.to)?;
    let amount = if request.amount.eq_ignore_ascii_case("max") {
        U256::MAX
    } else {
        parse_units(&request.amount, token.decimals())?
    };
    if amount.is_zero() {
        return Err(ApiError::bad_request("Amount must be greater than zero"));
    }

    let call = withdraw_call(token, amount, to)?;
    Ok(Json(CallsResponse {
        chain_id: request.chain_id,
        calls: to_payloads(&[call]),
    }))
}

/// USDC supplied to Aave by an account, per chain.
#[utoipa::path(
    get,
    path = "/v1/aave/positions/{address}",
    tag = "Aave",
    params(("address" = String, Path, description = "Account address")),
    responses(
        (status = 200, description = "Non-zero supplied positions", body = PositionsResponse),
        (status = 400, description = "Invalid address")
    )
)]
pub async fn positions(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<PositionsResponse>, ApiError> {
    let owner = parse_address(&address)?;
    let positions = state.aave.supplied_positions(owner).await;
    Ok(Json(PositionsResponse { address, positions }))
}

/// USDC reserve yields on every chain, highest supply yield first.
#[utoipa::path(
    get,
    path = "/v1/aave/yields",
    tag = "Aave",
    responses(
        (status = 200, description = "Yields and best markets", body = YieldsResponse)
    )
)]
pub async fn yields(State(state): State<AppState>) -> Json<YieldsResponse> {
    let mut yields = state.aave.usdc_yields().await;
    let best = best_yields(&yields);
    sort_by_supply_yield(&mut yields);
    Json(YieldsResponse { yields, best })
}
