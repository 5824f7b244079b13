//! User storage capability.
//!
//! Handlers and middleware depend only on [`UserStore`]; the concrete
//! backend is chosen at startup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::users::model::{NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("edit conflict")]
    EditConflict,
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store task aborted: {0}")]
    Aborted(String),
}

/// Connection pool figures for the debug endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub open_connections: u32,
    pub idle_connections: usize,
    pub max_open_connections: u32,
}

#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Insert a new record; the store assigns id, creation time and version 1.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Write `user` back only if the stored version still equals `user.version`.
    /// Returns the record carrying the incremented version.
    async fn update(&self, user: &User) -> Result<User, StoreError>;

    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}

/// Applies a fixed deadline to every store call.
///
/// Each call runs on its own task, so the operation keeps going (until it
/// finishes or hits the deadline) even if the request that started it is
/// dropped because the client went away.
#[derive(Clone)]
pub struct DeadlineStore {
    inner: Arc<dyn UserStore>,
    timeout: Duration,
}

impl DeadlineStore {
    pub fn new(inner: Arc<dyn UserStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn run<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn UserStore>) -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, StoreError>> + Send + 'static,
    {
        let timeout = self.timeout;
        let fut = f(self.inner.clone());
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(timeout)),
            }
        });

        match handle.await {
            Ok(Err(StoreError::Timeout(t))) => {
                tracing::warn!(operation = op, timeout = ?t, "User store operation timed out");
                Err(StoreError::Timeout(t))
            }
            Ok(result) => result,
            Err(e) => Err(StoreError::Aborted(e.to_string())),
        }
    }
}

#[async_trait]
impl UserStore for DeadlineStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        self.run("insert", move |store| async move { store.insert(user).await })
            .await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        self.run("get_by_id", move |store| async move { store.get_by_id(id).await })
            .await
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let email = email.to_string();
        self.run("get_by_email", move |store| async move {
            store.get_by_email(&email).await
        })
        .await
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let user = user.clone();
        self.run("update", move |store| async move { store.update(&user).await })
            .await
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        self.inner.pool_stats()
    }
}
