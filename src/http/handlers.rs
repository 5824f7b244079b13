//! Route handlers.
//!
//! Handlers translate between HTTP and [`UserService`](crate::users::UserService);
//! every failure leaves through [`ApiError`].

use axum::body::Bytes;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::middleware::CurrentUser;
use crate::http::server::AppState;
use crate::users::{Credentials, RegisterInput, UserPatch};

/// Raw request body with extraction failures reported as JSON errors.
pub struct RawBody(pub Bytes);

impl<S> FromRequest<S> for RawBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Bytes::from_request(req, state)
            .await
            .map(RawBody)
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
    }
}

/// Decode a single JSON value, rejecting unknown fields and trailing data.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("body must not be empty".into()));
    }

    serde_json::from_slice(body).map_err(|e| {
        use serde_json::error::Category;
        let message = match e.classify() {
            Category::Syntax | Category::Eof => {
                format!("body contains badly-formed JSON (at line {} column {})", e.line(), e.column())
            }
            Category::Data => format!("body contains invalid data: {e}"),
            Category::Io => format!("body could not be read: {e}"),
        };
        ApiError::BadRequest(message)
    })
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "available",
        "system_info": {
            "environment": state.info.environment.as_str(),
            "version": state.info.version,
        }
    }))
}

pub async fn register(
    State(state): State<AppState>,
    RawBody(body): RawBody,
) -> Result<impl IntoResponse, ApiError> {
    let input: RegisterInput = decode_json(&body)?;
    let user = state.users.register(input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

pub async fn authenticate(
    State(state): State<AppState>,
    RawBody(body): RawBody,
) -> Result<Json<Value>, ApiError> {
    let credentials: Credentials = decode_json(&body)?;
    let token = state.users.authenticate(credentials).await?;
    Ok(Json(json!({ "token": token })))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "user": user }))
}

/// `PATCH /service/users/{id}`.
///
/// Ownership is settled before the body is read, so a foreign caller
/// gets 403 whatever they sent.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    req: Request,
) -> Result<Json<Value>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound)?;

    let current = state.users.load_for_update(&caller, id).await?;
    let RawBody(body) = RawBody::from_request(req, &state).await?;
    let patch: UserPatch = decode_json(&body)?;
    let user = state.users.apply_update(current, patch).await?;

    Ok(Json(json!({ "user": user })))
}

pub async fn debug_vars(State(state): State<AppState>) -> Json<Value> {
    let tasks = tokio::runtime::Handle::current().metrics().num_alive_tasks();
    Json(json!({
        "version": state.info.version,
        "environment": state.info.environment.as_str(),
        "tasks": tasks,
        "database": state.users.store().pool_stats(),
        "uptime_secs": state.info.started.elapsed().as_secs(),
        "timestamp": Utc::now().timestamp(),
        "requests": state.stats.snapshot(),
        "rate_limited_clients": state.limiter.tracked_clients(),
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method.to_string())
}
