//! Request pipeline stages.
//!
//! # Data Flow
//! ```text
//! metrics.rs       count request, status, processing time (never rejects)
//!     → recover.rs       fault in a later stage → 500 + Connection: close
//!     → cors.rs          trusted origin headers, preflight short-circuit
//!     → rate_limit.rs    per-client token bucket → 429
//!     → authenticate.rs  bearer token → Identity in request extensions
//!     → route handler
//! ```
//!
//! Each stage either writes a response itself or hands the request on.
//! The order is fixed in `server.rs`.

pub mod authenticate;
pub mod cors;
pub mod metrics;
pub mod rate_limit;
pub mod recover;

pub use authenticate::{authenticate, CurrentUser};
pub use cors::cors;
pub use metrics::track_requests;
pub use rate_limit::rate_limit;
pub use recover::recover_panic;
