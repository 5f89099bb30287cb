// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Supported networks and tokens.

use axum::{extract::State, Json};

use crate::{
    blockchain::{network_by_chain_id, tokens_on_chain},
    models::{ChainInfo, TokenInfo},
    state::AppState,
};

/// List the supported chains and the tokens deployed on each.
#[utoipa::path(
    get,
    path = "/v1/chains",
    tag = "Chains",
    responses(
        (status = 200, description = "Supported chains in aggregation order", body = [ChainInfo])
    )
)]
pub async fn list_chains(State(state): State<AppState>) -> Json<Vec<ChainInfo>> {
    let chains = state
        .chains
        .chain_ids()
        .into_iter()
        .filter_map(network_by_chain_id)
        .map(|network| ChainInfo {
            chain_id: network.chain_id,
            name: network.name.to_string(),
            explorer_url: network.explorer_url.to_string(),
            tokens: tokens_on_chain(network.chain_id)
                .into_iter()
                .map(|d| TokenInfo {
                    symbol: d.symbol().to_string(),
                    name: d.token.name.to_string(),
                    decimals: d.decimals(),
                    address: d.address.to_checksum(None),
                })
                .collect(),
        })
        .collect();
    Json(chains)
}
