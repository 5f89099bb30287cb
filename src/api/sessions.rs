// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Live form endpoints.
//!
//! A fee session mirrors one transfer form: each edit re-runs the debounced
//! fee lanes in the background and the client polls the session for the
//! latest fees, max amount and submit readiness. Quote feeds do the same
//! for the swap form's output quote.

use std::sync::Arc;

use alloy::primitives::U256;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use super::fees::resolve_balance;
use crate::{
    blockchain::{format_units, parse_address, parse_units, USDC_TOKEN},
    error::ApiError,
    fees::{Estimate, FeeSession, FeeSnapshot, SessionError},
    models::{
        FeeSessionResponse, OpenFeeSessionRequest, QuoteFeedResponse, SubmitResponse,
        UpdateFeeSessionRequest, UpdateQuoteFeedRequest,
    },
    protocols::uniswap::{QuoteFeed, QuoteState, DEFAULT_FEE_TIER},
    state::AppState,
};

fn find_fee_session(state: &AppState, id: &Uuid) -> Result<Arc<FeeSession>, ApiError> {
    state
        .fee_sessions
        .get(id)
        .ok_or_else(|| ApiError::not_found(format!("Fee session {id} not found")))
}

fn find_quote_feed(state: &AppState, id: &Uuid) -> Result<Arc<QuoteFeed>, ApiError> {
    state
        .quote_feeds
        .get(id)
        .ok_or_else(|| ApiError::not_found(format!("Quote feed {id} not found")))
}

fn failure(estimate: &Estimate) -> Option<String> {
    match estimate {
        Estimate::Failed(e) => Some(e.clone()),
        _ => None,
    }
}

fn fee_session_response(id: Uuid, snapshot: &FeeSnapshot) -> FeeSessionResponse {
    let units = |value: U256| format_units(value, USDC_TOKEN.decimals);
    FeeSessionResponse {
        id,
        token: USDC_TOKEN.symbol.to_string(),
        phase: snapshot.phase(),
        chain_id: snapshot.chain_id,
        recipient: snapshot.recipient.map(|r| r.to_checksum(None)),
        recipient_error: snapshot.recipient_error.clone(),
        amount: snapshot.amount.map(units),
        amount_error: snapshot.amount_error.clone(),
        balance: units(snapshot.balance),
        base_fee: snapshot.base_fee.value().map(units),
        base_fee_error: failure(&snapshot.base_fee),
        tx_fee: snapshot.tx_fee.value().map(units),
        tx_fee_error: failure(&snapshot.tx_fee),
        max_amount: snapshot.max_amount().map(units),
        insufficient: snapshot.insufficient(),
        can_submit: snapshot.can_submit(),
    }
}

/// Invalid form input is kept on the session and reported in its state.
fn recorded(result: Result<(), SessionError>) -> Result<(), SessionError> {
    match result {
        Err(SessionError::InvalidRecipient(_) | SessionError::InvalidAmount(_)) => Ok(()),
        other => other,
    }
}

/// Open a transfer form session.
#[utoipa::path(
    post,
    path = "/v1/fee-sessions",
    tag = "Sessions",
    request_body = OpenFeeSessionRequest,
    responses(
        (status = 201, description = "Session opened", body = FeeSessionResponse),
        (status = 400, description = "Invalid sender, chain or balance"),
        (status = 502, description = "Balance lookup failed")
    )
)]
pub async fn open_fee_session(
    State(state): State<AppState>,
    Json(request): Json<OpenFeeSessionRequest>,
) -> Result<(StatusCode, Json<FeeSessionResponse>), ApiError> {
    let sender = parse_address(&request.sender)?;
    let balance = resolve_balance(&state, sender, request.balance.as_deref()).await?;

    let session = state.fee_session(sender);
    session.set_balance(balance)?;
    if let Some(chain_id) = request.chain_id {
        session.select_chain(chain_id)?;
    }

    let id = session.id();
    let session = state.fee_sessions.insert(id, session);
    info!(session = %id, sender = %sender, "fee session opened");
    Ok((
        StatusCode::CREATED,
        Json(fee_session_response(id, &session.snapshot())),
    ))
}

/// Current fees and form state of a session.
#[utoipa::path(
    get,
    path = "/v1/fee-sessions/{id}",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session state", body = FeeSessionResponse),
        (status = 404, description = "Unknown or closed session")
    )
)]
pub async fn get_fee_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeeSessionResponse>, ApiError> {
    let session = find_fee_session(&state, &id)?;
    Ok(Json(fee_session_response(id, &session.snapshot())))
}

/// Apply form edits. Fees are re-estimated in the background.
#[utoipa::path(
    patch,
    path = "/v1/fee-sessions/{id}",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = UpdateFeeSessionRequest,
    responses(
        (status = 200, description = "Session state after the edit", body = FeeSessionResponse),
        (status = 400, description = "Unsupported chain or invalid balance"),
        (status = 404, description = "Unknown or closed session")
    )
)]
pub async fn update_fee_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateFeeSessionRequest>,
) -> Result<Json<FeeSessionResponse>, ApiError> {
    let session = find_fee_session(&state, &id)?;

    if let Some(raw) = request.balance.as_deref() {
        session.set_balance(parse_units(raw, USDC_TOKEN.decimals)?)?;
    }
    if let Some(chain_id) = request.chain_id {
        session.select_chain(chain_id)?;
    }
    if let Some(raw) = request.recipient.as_deref() {
        recorded(session.set_recipient(raw))?;
    }
    if let Some(raw) = request.amount.as_deref() {
        recorded(session.set_amount(raw))?;
    }

    Ok(Json(fee_session_response(id, &session.snapshot())))
}

/// Submit the transfer. Success closes the session.
#[utoipa::path(
    post,
    path = "/v1/fee-sessions/{id}/submit",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Transfer submitted", body = SubmitResponse),
        (status = 400, description = "Recipient or amount invalid"),
        (status = 404, description = "Unknown or closed session"),
        (status = 422, description = "Fee unknown or balance insufficient"),
        (status = 502, description = "Submission failed")
    )
)]
pub async fn submit_fee_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let session = find_fee_session(&state, &id)?;
    let user_op_hash = session.submit().await?;
    state.fee_sessions.remove(&id);
    Ok(Json(SubmitResponse { user_op_hash }))
}

/// Close a session and abandon its pending estimates.
#[utoipa::path(
    delete,
    path = "/v1/fee-sessions/{id}",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown or closed session")
    )
)]
pub async fn close_fee_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = state
        .fee_sessions
        .remove(&id)
        .ok_or_else(|| ApiError::not_found(format!("Fee session {id} not found")))?;
    session.close();
    Ok(StatusCode::NO_CONTENT)
}

fn quote_feed_response(id: Uuid, state: QuoteState) -> QuoteFeedResponse {
    let (status, quote, error) = match state {
        QuoteState::Idle => ("idle", None, None),
        QuoteState::Pending => ("pending", None, None),
        QuoteState::Ready(quote) => ("ready", Some(quote), None),
        QuoteState::Failed(e) => ("failed", None, Some(e)),
    };
    QuoteFeedResponse {
        id,
        status: status.to_string(),
        quote,
        error,
    }
}

/// Open a debounced quote feed for a swap form.
#[utoipa::path(
    post,
    path = "/v1/swaps/quote-feeds",
    tag = "Sessions",
    responses(
        (status = 201, description = "Feed opened", body = QuoteFeedResponse)
    )
)]
pub async fn open_quote_feed(
    State(state): State<AppState>,
) -> (StatusCode, Json<QuoteFeedResponse>) {
    let id = Uuid::new_v4();
    let feed = state.quote_feeds.insert(id, state.quote_feed());
    (
        StatusCode::CREATED,
        Json(quote_feed_response(id, feed.current())),
    )
}

/// Latest quote of a feed.
#[utoipa::path(
    get,
    path = "/v1/swaps/quote-feeds/{id}",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Feed id")),
    responses(
        (status = 200, description = "Feed state", body = QuoteFeedResponse),
        (status = 404, description = "Unknown feed")
    )
)]
pub async fn get_quote_feed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuoteFeedResponse>, ApiError> {
    let feed = find_quote_feed(&state, &id)?;
    Ok(Json(quote_feed_response(id, feed.current())))
}

/// Replace the swap input. The quote follows after the quiet window.
#[utoipa::path(
    patch,
    path = "/v1/swaps/quote-feeds/{id}",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Feed id")),
    request_body = UpdateQuoteFeedRequest,
    responses(
        (status = 200, description = "Feed state after the edit", body = QuoteFeedResponse),
        (status = 404, description = "Unknown feed")
    )
)]
pub async fn update_quote_feed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateQuoteFeedRequest>,
) -> Result<Json<QuoteFeedResponse>, ApiError> {
    let feed = find_quote_feed(&state, &id)?;
    feed.update(
        request.chain_id,
        &request.token_in,
        &request.token_out,
        &request.amount_in,
        request.fee.unwrap_or(DEFAULT_FEE_TIER),
    );
    Ok(Json(quote_feed_response(id, feed.current())))
}

#[utoipa::path(
    delete,
    path = "/v1/swaps/quote-feeds/{id}",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Feed id")),
    responses(
        (status = 204, description = "Feed closed"),
        (status = 404, description = "Unknown feed")
    )
)]
pub async fn close_quote_feed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .quote_feeds
        .remove(&id)
        .ok_or_else(|| ApiError::not_found(format!("Quote feed {id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}
