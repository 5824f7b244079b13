//! Per-client admission control.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Reject with 429 once the client's bucket is empty. Skipped entirely
/// when the limiter is disabled.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !state.limiter.is_enabled() {
        return next.run(req).await;
    }

    let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>().copied() else {
        return ApiError::internal("client address unavailable for rate limiting").into_response();
    };

    if !state.limiter.allow(addr.ip()) {
        tracing::debug!(client = %addr.ip(), "Rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }

    next.run(req).await
}
