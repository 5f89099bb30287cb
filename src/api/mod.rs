// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    balances::ChainFailure,
    blockchain::{CallPayload, TokenBalance},
    models::{
        AaveMaxSupplyRequest, AaveMaxSupplyResponse, AaveSupplyRequest, AaveWithdrawRequest,
        BalancesResponse, CabBalanceResponse, CallsResponse,
        ChainInfo, FeeEstimateRequest, FeeEstimateResponse, FeeSessionResponse, MaxAmountRequest,
        MaxAmountResponse, OpenFeeSessionRequest, PositionsResponse, QuoteFeedResponse,
        SubmitResponse, SwapCallsRequest, SwapQuoteRequest, TokenInfo, TransferCallsRequest,
        UpdateFeeSessionRequest, UpdateQuoteFeedRequest, YieldsResponse,
    },
    fees::FeePhase,
    protocols::{
        aave::{BestYields, SuppliedPosition, YieldInfo},
        uniswap::SwapQuote,
    },
    state::AppState,
};

pub mod aave;
pub mod balances;
pub mod chains;
pub mod fees;
pub mod health;
pub mod sessions;
pub mod swaps;
pub mod transfers;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/chains", get(chains::list_chains))
        .route("/accounts/{address}/balances", get(balances::get_balances))
        .route(
            "/accounts/{address}/cab-balance",
            get(balances::get_cab_balance),
        )
        .route("/fees/max-amount", post(fees::max_amount))
        .route("/fees/estimate", post(fees::estimate_fee))
        .route("/transfers/calls", post(transfers::transfer_calls))
        .route("/swaps/quote", post(swaps::quote))
        .route("/swaps/calls", post(swaps::swap_calls))
        .route("/fee-sessions", post(sessions::open_fee_session))
        .route(
            "/fee-sessions/{id}",
            get(sessions::get_fee_session)
                .patch(sessions::update_fee_session)
                .delete(sessions::close_fee_session),
        )
        .route(
            "/fee-sessions/{id}/submit",
            post(sessions::submit_fee_session),
        )
        .route("/swaps/quote-feeds", post(sessions::open_quote_feed))
        .route(
            "/swaps/quote-feeds/{id}",
            get(sessions::get_quote_feed)
                .patch(sessions::update_quote_feed)
                .delete(sessions::close_quote_feed),
        )
        .route("/aave/supply/calls", post(aave::supply))
        .route("/aave/supply/max", post(aave::max_supply_amount))
        .route("/aave/withdraw/calls", post(aave::withdraw))
        .route("/aave/positions/{address}", get(aave::positions))
        .route("/aave/yields", get(aave::yields));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        chains::list_chains,
        balances::get_balances,
        balances::get_cab_balance,
        fees::max_amount,
        fees::estimate_fee,
        transfers::transfer_calls,
        swaps::quote,
        swaps::swap_calls,
        sessions::open_fee_session,
        sessions::get_fee_session,
        sessions::update_fee_session,
        sessions::submit_fee_session,
        sessions::close_fee_session,
        sessions::open_quote_feed,
        sessions::get_quote_feed,
        sessions::update_quote_feed,
        sessions::close_quote_feed,
        aave::supply,
        aave::max_supply_amount,
        aave::withdraw,
        aave::positions,
        aave::yields
    ),
    components(
        schemas(
            health::HealthResponse,
            health::ReadyResponse,
            ChainInfo,
            TokenInfo,
            TokenBalance,
            ChainFailure,
            BalancesResponse,
            CabBalanceResponse,
            MaxAmountRequest,
            MaxAmountResponse,
            FeeEstimateRequest,
            FeeEstimateResponse,
            TransferCallsRequest,
            SwapQuoteRequest,
            SwapCallsRequest,
            SwapQuote,
            OpenFeeSessionRequest,
            UpdateFeeSessionRequest,
            FeeSessionResponse,
            FeePhase,
            SubmitResponse,
            UpdateQuoteFeedRequest,
            QuoteFeedResponse,
            AaveSupplyRequest,
            AaveMaxSupplyRequest,
            AaveMaxSupplyResponse,
            AaveWithdrawRequest,
            CallPayload,
            CallsResponse,
            SuppliedPosition,
            PositionsResponse,
            YieldInfo,
            BestYields,
            YieldsResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and RPC reachability"),
        (name = "Chains", description = "Supported networks and tokens"),
        (name = "Balances", description = "Multi-chain and chain-abstracted balances"),
        (name = "Fees", description = "Fee-aware transfer amounts"),
        (name = "Transfers", description = "ERC-20 transfer calldata"),
        (name = "Swaps", description = "Uniswap V3 quotes and swap calldata"),
        (name = "Sessions", description = "Live transfer forms and swap quote feeds"),
        (name = "Aave", description = "Aave V3 lending")
    )
)]
struct ApiDoc;
