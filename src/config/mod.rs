//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional config file (TOML) via loader.rs
//!     → flags / environment variables via args.rs
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the signing secret is never rotated at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::Args;
pub use loader::{resolve, ConfigError};
pub use schema::{
    AuthConfig, CorsConfig, DatabaseConfig, Environment, ListenerConfig, LogFormat,
    ObservabilityConfig, RateLimitConfig, ServiceConfig, TimeoutConfig,
};
