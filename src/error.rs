// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blockchain::{AddressError, ChainClientError, UnitsError};
use crate::cab::CabError;
use crate::fees::{FeeError, SessionError};
use crate::protocols::ProtocolError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = %self.status, error = %self.message, "request failed");
        }
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<AddressError> for ApiError {
    fn from(e: AddressError) -> Self {
        Self::bad_request(format!("Invalid address: {e}"))
    }
}

impl From<UnitsError> for ApiError {
    fn from(e: UnitsError) -> Self {
        Self::bad_request(format!("Invalid amount: {e}"))
    }
}

impl From<ChainClientError> for ApiError {
    fn from(e: ChainClientError) -> Self {
        match e {
            ChainClientError::UnsupportedChain(_) | ChainClientError::UnsupportedToken(_) => {
                Self::bad_request(e.to_string())
            }
            ChainClientError::InvalidAddress(_) => Self::bad_request(e.to_string()),
            _ => Self::service_unavailable(e.to_string()),
        }
    }
}

impl From<CabError> for ApiError {
    fn from(e: CabError) -> Self {
        match e {
            CabError::Config(_) => Self::service_unavailable(e.to_string()),
            CabError::Request(_) | CabError::InvalidResponse(_) => Self::bad_gateway(e.to_string()),
        }
    }
}

impl From<FeeError> for ApiError {
    fn from(e: FeeError) -> Self {
        match e {
            FeeError::EstimationFailure(_) => Self::bad_gateway(e.to_string()),
            FeeError::UnsupportedToken { .. } | FeeError::ZeroAmount => {
                Self::bad_request(e.to_string())
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Fee(inner) => inner.into(),
            SessionError::SubmissionFailure(_) => Self::bad_gateway(e.to_string()),
            SessionError::Closed => Self::new(StatusCode::CONFLICT, e.to_string()),
            SessionError::InvalidRecipient(_) | SessionError::InvalidAmount(_) => {
                Self::bad_request(e.to_string())
            }
            SessionError::FeeUnknown | SessionError::InsufficientBalance => {
                Self::unprocessable(e.to_string())
            }
        }
    }
}

impl From<ProtocolError> for ApiError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Chain(inner) => inner.into(),
            ProtocolError::Quote(_) => Self::bad_gateway(e.to_string()),
            _ => Self::bad_request(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let unp = ApiError::unprocessable("oops");
        assert_eq!(unp.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(unp.message, "oops");
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        let estimation: ApiError = FeeError::EstimationFailure("timeout".into()).into();
        assert_eq!(estimation.status, StatusCode::BAD_GATEWAY);

        let zero: ApiError = FeeError::ZeroAmount.into();
        assert_eq!(zero.status, StatusCode::BAD_REQUEST);

        let rpc: ApiError = ProtocolError::Chain(ChainClientError::RpcError("down".into())).into();
        assert_eq!(rpc.status, StatusCode::SERVICE_UNAVAILABLE);

        let chain: ApiError = ChainClientError::UnsupportedChain(1).into();
        assert_eq!(chain.status, StatusCode::BAD_REQUEST);

        let insufficient: ApiError = SessionError::InsufficientBalance.into();
        assert_eq!(insufficient.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }
}
