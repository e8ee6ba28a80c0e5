//! REST error mapping
//!
//! Every engine error kind maps to exactly one HTTP status, decided here
//! and nowhere else. Bodies are always `{"detail": ...}` so clients never
//! parse library-shaped rejections.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{async_trait, Json};
use serde_json::json;
use thiserror::Error;
use types::errors::{CancelError, EngineError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Cancel(#[from] CancelError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Engine(e) => engine_status(e),
            ApiError::Cancel(CancelError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Cancel(CancelError::NotOwner) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

pub fn engine_status(error: &EngineError) -> StatusCode {
    match error {
        EngineError::ClientInput(_) => StatusCode::BAD_REQUEST,
        EngineError::AuthFailure(_) => StatusCode::UNAUTHORIZED,
        EngineError::DuplicateOrderId(_) => StatusCode::CONFLICT,
        EngineError::PairNotSupported { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::FokUnfillable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::SettlementFailed(_) => StatusCode::BAD_GATEWAY,
        EngineError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// `Json` extractor whose rejection is shaped like every other error.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}
