//! Outermost stage: request accounting.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    state.stats.request_started();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    state.stats.response_sent(status, start.elapsed());
    metrics::record_request(method.as_str(), status, start);
    response
}
