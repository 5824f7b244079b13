//! PostgreSQL-backed user store.
//!
//! Expects the table below to exist; schema management happens outside
//! this service.
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS users (
//!     id            uuid PRIMARY KEY DEFAULT gen_random_uuid(),
//!     created_at    timestamptz NOT NULL DEFAULT now(),
//!     email         text NOT NULL UNIQUE,
//!     password_hash text NOT NULL,
//!     first_name    text NOT NULL,
//!     last_name     text NOT NULL,
//!     activated     boolean NOT NULL,
//!     version       integer NOT NULL DEFAULT 1
//! );
//! ```

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::security::PasswordHash;
use crate::users::model::{NewUser, User};
use crate::users::store::{PoolStats, StoreError, UserStore};

const USER_COLUMNS: &str =
    "id, created_at, email, password_hash, first_name, last_name, activated, version";

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
    max_open: u32,
}

impl PgUserStore {
    /// Open a pool sized from `config` and check that the database answers.
    ///
    /// sqlx keeps no separate idle ceiling; the idle setting is used as the
    /// number of connections kept warm, bounded by the pool size.
    pub async fn connect(config: &DatabaseConfig, dsn: &str) -> Result<Self, StoreError> {
        let idle_timeout = config
            .idle_timeout()
            .map_err(|e| sqlx::Error::Configuration(Box::new(e)))?;
        let min_connections = config.max_idle_conns.min(config.max_open_conns);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_open_conns)
            .min_connections(min_connections)
            .idle_timeout(idle_timeout)
            .connect(dsn)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        tracing::info!(
            max_open = config.max_open_conns,
            min_idle = min_connections,
            idle_timeout = ?idle_timeout,
            "Database connection pool established"
        );

        Ok(Self::from_pool(pool, config.max_open_conns))
    }

    pub fn from_pool(pool: PgPool, max_open: u32) -> Self {
        Self { pool, max_open }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        password: PasswordHash::from_stored(row.try_get("password_hash")?),
        activated: row.try_get("activated")?,
        version: row.try_get("version")?,
    })
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, activated) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&user.email)
            .bind(user.password.as_str())
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.activated)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(user_from_row(&row)?)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(user_from_row(&row)?)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(user_from_row(&row)?)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let sql = format!(
            "UPDATE users \
             SET email = $1, password_hash = $2, first_name = $3, last_name = $4, \
                 activated = $5, version = version + 1 \
             WHERE id = $6 AND version = $7 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&user.email)
            .bind(user.password.as_str())
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.activated)
            .bind(user.id)
            .bind(user.version)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .ok_or(StoreError::EditConflict)?;

        Ok(user_from_row(&row)?)
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(PoolStats {
            open_connections: self.pool.size(),
            idle_connections: self.pool.num_idle(),
            max_open_connections: self.max_open,
        })
    }
}
