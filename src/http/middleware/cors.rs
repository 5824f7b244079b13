//! CORS for configured trusted origins.
//!
//! Only an exact match on the `Origin` header is trusted. A preflight
//! (`OPTIONS` carrying `Access-Control-Request-Method`) from a trusted
//! origin is answered here with an empty 200; nothing downstream runs.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::server::AppState;

const ALLOWED_METHODS: &str = "OPTIONS, PUT, PATCH, DELETE";
const ALLOWED_HEADERS: &str = "Authorization, Content-Type";

pub async fn cors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let origin = trusted_origin(req.headers(), &state.trusted_origins);
    let preflight = req.method() == Method::OPTIONS
        && req.headers().contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);

    let mut response = match (&origin, preflight) {
        (Some(_), true) => preflight_response(),
        _ => next.run(req).await,
    };

    let headers = response.headers_mut();
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
    headers.append(header::VARY, HeaderValue::from_static("Access-Control-Request-Method"));
    if let Some(origin) = origin {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    response
}

fn trusted_origin(headers: &HeaderMap, trusted: &[String]) -> Option<HeaderValue> {
    let origin = headers.get(header::ORIGIN)?;
    let value = origin.to_str().ok()?;
    if value.is_empty() {
        return None;
    }
    trusted
        .iter()
        .any(|t| t == value)
        .then(|| origin.clone())
}

fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    response
}
