//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-client token bucket)
//!     → token.rs (bearer token verification, via the authenticate middleware)
//!     → Pass to route handlers
//!
//! Registration / login:
//!     → password.rs (Argon2id hash and match)
//!     → token.rs (issue bearer token)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a malformed or unverifiable credential never degrades to anonymous
//! - Expired tokens are distinguishable from forged ones
//! - No trust in client input

pub mod password;
pub mod rate_limit;
pub mod token;

pub use password::{PasswordError, PasswordHash};
pub use rate_limit::RateLimiter;
pub use token::{TokenCodec, TokenError};
