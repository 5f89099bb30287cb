// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Balance query endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;

use crate::{
    balances::AggregatedBalances,
    blockchain::{format_units, parse_address, USDC_TOKEN},
    error::ApiError,
    models::{BalancesQuery, BalancesResponse, CabBalanceResponse},
    state::AppState,
};

/// Get token balances of an account on every supported chain.
///
/// Chains that fail are listed in `errors` while the healthy chains are
/// still returned. Complete answers are cached briefly; pass
/// `refresh=true` to bypass the cache.
#[utoipa::path(
    get,
    path = "/v1/accounts/{address}/balances",
    tag = "Balances",
    params(
        ("address" = String, Path, description = "Account address"),
        BalancesQuery
    ),
    responses(
        (status = 200, description = "Per-chain balances", body = BalancesResponse),
        (status = 400, description = "Invalid address")
    )
)]
pub async fn get_balances(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<BalancesQuery>,
) -> Result<Json<BalancesResponse>, ApiError> {
    let owner = parse_address(&address)?;

    if query.refresh.unwrap_or(false) {
        state.balance_cache.invalidate(&owner);
    } else if let Some(cached) = state.balance_cache.get(&owner) {
        debug!(owner = %owner, "balance cache hit");
        return Ok(Json(to_response(&address, cached, true)));
    }

    let fetched = state.balances.fetch(owner).await;
    state.balance_cache.put(owner, &fetched);
    Ok(Json(to_response(&address, fetched, false)))
}

fn to_response(address: &str, aggregated: AggregatedBalances, cached: bool) -> BalancesResponse {
    BalancesResponse {
        address: address.to_string(),
        error: aggregated.error().cloned(),
        balances: aggregated.balances,
        errors: aggregated.errors,
        cached,
    }
}

/// Get the chain-abstracted USDC balance of an account.
#[utoipa::path(
    get,
    path = "/v1/accounts/{address}/cab-balance",
    tag = "Balances",
    params(("address" = String, Path, description = "Account address")),
    responses(
        (status = 200, description = "Unified USDC balance", body = CabBalanceResponse),
        (status = 400, description = "Invalid address"),
        (status = 502, description = "Chain-abstraction service failed")
    )
)]
pub async fn get_cab_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<CabBalanceResponse>, ApiError> {
    let owner = parse_address(&address)?;
    let balance = state.cab_balance.read_balance(owner).await?;
    Ok(Json(CabBalanceResponse {
        address,
        token: USDC_TOKEN.symbol.to_string(),
        balance: format_units(balance, USDC_TOKEN.decimals),
        balance_raw: balance.to_string(),
    }))
}
