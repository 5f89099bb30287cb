// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;

use crate::{
    blockchain::{erc20, parse_address, parse_units, to_payloads, token_deployment},
    error::ApiError,
    models::{CallsResponse, TransferCallsRequest},
};

/// Build the ERC-20 `transfer` call for a token transfer.
#[utoipa::path(
    post,
    path = "/v1/transfers/calls",
    tag = "Transfers",
    request_body = TransferCallsRequest,
    responses(
        (status = 200, description = "Transfer call", body = CallsResponse),
        (status = 400, description = "Invalid chain, token, recipient or amount")
    )
)]
pub async fn transfer_calls(
    Json(request): Json<TransferCallsRequest>,
) -> Result<Json<CallsResponse>, ApiError> {
    let token = token_deployment(request.chain_id, &request.token).ok_or_else(|| {
        ApiError::bad_request(format!(
            "{} is not deployed on chain {}",
            request.token, request.chain_id
        ))
    })?;
    let recipient = parse_address(&request.recipient)?;
    let amount = parse_units(&request.amount, token.decimals())?;
    if amount.is_zero() {
        return Err(ApiError::bad_request("Amount must be greater than zero"));
    }

    let call = erc20::transfer_call(token.address, recipient, amount);
    Ok(Json(CallsResponse {
        chain_id: request.chain_id,
        calls: to_payloads(&[call]),
    }))
}
