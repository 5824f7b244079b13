//! Bearer token authentication.
//!
//! Resolves the caller for every request and stores the result as an
//! [`Identity`] in the request extensions. A missing header means
//! anonymous; a present but unusable one is rejected, never downgraded.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::users::{Identity, ServiceError, User, UserService};

pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let resolved = resolve_identity(&state.users, req.headers()).await;
    let mut response = match resolved {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

async fn resolve_identity(users: &UserService, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(Identity::Anonymous);
    };

    let token = bearer_token(value).ok_or(ApiError::InvalidAuthHeader)?;

    match users.identify(token).await {
        Ok(user) => Ok(Identity::User(user)),
        Err(ServiceError::Token(_) | ServiceError::NotFound) => Err(ApiError::InvalidToken),
        Err(e) => Err(e.into()),
    }
}

/// `Bearer <token>`: exactly two space-separated parts, scheme case-sensitive.
fn bearer_token(value: &HeaderValue) -> Option<&str> {
    let value = value.to_str().ok()?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Some(token),
        _ => None,
    }
}

/// The authenticated caller. Rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .and_then(Identity::user)
            .map(|user| CurrentUser(user.clone()))
            .ok_or(ApiError::AuthenticationRequired)
    }
}
