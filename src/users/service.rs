//! Account operations: registration, login and identity resolution.
//!
//! The profile update protocol lives in `update.rs` on the same type.

use std::sync::Arc;

use uuid::Uuid;

use crate::security::{PasswordError, PasswordHash, TokenCodec, TokenError};
use crate::users::model::{Credentials, NewUser, RegisterInput, User};
use crate::users::store::{StoreError, UserStore};
use crate::users::validation::{FieldErrors, Validator};

pub const DUPLICATE_EMAIL_MESSAGE: &str = "a user with this email address already exists";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("invalid authentication credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("record not found")]
    NotFound,
    #[error("not permitted")]
    NotPermitted,
    #[error("edit conflict")]
    EditConflict,
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound,
            StoreError::EditConflict => ServiceError::EditConflict,
            StoreError::DuplicateEmail => {
                ServiceError::Validation(FieldErrors::single("email", DUPLICATE_EMAIL_MESSAGE))
            }
            other => ServiceError::Store(other),
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    pub(crate) store: Arc<dyn UserStore>,
    tokens: TokenCodec,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenCodec) -> Self {
        Self { store, tokens }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Create an account. Activation is unconditional.
    pub async fn register(&self, input: RegisterInput) -> Result<User, ServiceError> {
        let mut v = Validator::new();
        v.profile(&input.email, &input.first_name, &input.last_name, Some(input.password.as_str()));
        v.finish().map_err(ServiceError::Validation)?;

        let password = PasswordHash::hash_blocking(input.password).await?;
        let user = self
            .store
            .insert(NewUser {
                email: input.email,
                first_name: input.first_name,
                last_name: input.last_name,
                password,
                activated: true,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Exchange email and password for a bearer token.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<String, ServiceError> {
        let mut v = Validator::new();
        v.email(&credentials.email);
        v.password(&credentials.password);
        v.finish().map_err(ServiceError::Validation)?;

        let user = match self.store.get_by_email(&credentials.email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(ServiceError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        if !user.password.matches_blocking(credentials.password).await? {
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(self.tokens.issue(user.id)?)
    }

    /// Resolve a bearer token to the user it was issued for.
    pub async fn identify(&self, token: &str) -> Result<User, ServiceError> {
        let subject = self.tokens.verify(token)?;
        Ok(self.store.get_by_id(subject).await?)
    }

    pub async fn profile(&self, id: Uuid) -> Result<User, ServiceError> {
        Ok(self.store.get_by_id(id).await?)
    }
}
