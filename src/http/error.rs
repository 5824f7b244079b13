//! HTTP error responses.
//!
//! The only place a failure becomes a status code and a body. Bodies are
//! always `{"error": ...}`; internal detail goes to the log, never to the
//! client.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::security::TokenError;
use crate::users::{FieldErrors, ServiceError};

pub const INTERNAL_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("invalid authentication credentials")]
    InvalidCredentials,
    #[error("invalid authentication header")]
    InvalidAuthHeader,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,
    #[error("your user account doesn't have the necessary permissions to access this resource")]
    NotPermitted,
    #[error("the requested resource could not be found")]
    NotFound,
    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(String),
    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidCredentials
            | ApiError::InvalidAuthHeader
            | ApiError::InvalidToken
            | ApiError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ApiError::NotPermitted => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::EditConflict => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn challenges_bearer(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidAuthHeader | ApiError::InvalidToken | ApiError::AuthenticationRequired
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => json!({ "error": errors }),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                json!({ "error": INTERNAL_ERROR_MESSAGE })
            }
            other => json!({ "error": other.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        if self.challenges_bearer() {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => ApiError::Validation(errors),
            ServiceError::InvalidCredentials => ApiError::InvalidCredentials,
            ServiceError::Token(TokenError::Invalid | TokenError::Expired) => ApiError::InvalidToken,
            ServiceError::NotFound => ApiError::NotFound,
            ServiceError::NotPermitted => ApiError::NotPermitted,
            ServiceError::EditConflict => ApiError::EditConflict,
            ServiceError::Token(e @ (TokenError::Signing(_) | TokenError::ExpiryOutOfRange)) => {
                ApiError::internal(e)
            }
            ServiceError::Store(e) => ApiError::internal(e),
            ServiceError::Password(e) => ApiError::internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::StoreError;
    use std::time::Duration;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_keep_field_map() {
        let response = ApiError::Validation(FieldErrors::single("email", "must be provided")).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await, json!({"error": {"email": "must be provided"}}));
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let err: ApiError = ServiceError::Store(StoreError::Timeout(Duration::from_secs(3))).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body, json!({"error": INTERNAL_ERROR_MESSAGE}));
        assert!(!body.to_string().contains("timed out"));
    }

    #[test]
    fn token_failures_challenge_for_bearer() {
        let response = ApiError::from(ServiceError::Token(TokenError::Expired)).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

        let response = ApiError::InvalidCredentials.into_response();
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(ApiError::from(ServiceError::NotPermitted).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::from(ServiceError::EditConflict).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(ServiceError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(ServiceError::Token(TokenError::ExpiryOutOfRange)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(ServiceError::from(StoreError::DuplicateEmail)).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
