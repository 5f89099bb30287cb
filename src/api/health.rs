// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tokio::task::JoinSet;
use utoipa::ToSchema;

use crate::state::AppState;

const RPC_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Latest block per chain id, or the reason the RPC endpoint is unusable.
    pub chains: BTreeMap<u64, String>,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check endpoint handler.
///
/// Queries the latest block on every chain. Returns 503 if any RPC endpoint
/// is unreachable.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Every chain answered", body = ReadyResponse),
        (status = 503, description = "At least one chain is unreachable", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let mut tasks = JoinSet::new();
    for chain_id in state.chains.chain_ids() {
        let chains = state.chains.clone();
        tasks.spawn(async move {
            let result = match chains.get(chain_id) {
                Ok(client) => {
                    match tokio::time::timeout(RPC_CHECK_TIMEOUT, client.get_block_number()).await {
                        Ok(Ok(block)) => Ok(format!("block {block}")),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(_) => Err("timed out".to_string()),
                    }
                }
                Err(e) => Err(e.to_string()),
            };
            (chain_id, result)
        });
    }

    let mut chains = BTreeMap::new();
    let mut all_ok = true;
    while let Some(joined) = tasks.join_next().await {
        let Ok((chain_id, result)) = joined else {
            all_ok = false;
            continue;
        };
        let entry = match result {
            Ok(block) => block,
            Err(e) => {
                all_ok = false;
                e
            }
        };
        chains.insert(chain_id, entry);
    }

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        chains,
    };
    (status, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
