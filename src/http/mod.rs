//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (ambient layers: request ID, tracing, timeout, body limit)
//!     → middleware/ (metrics → recover → CORS → rate limit → authenticate)
//!     → handlers.rs (decode, call UserService, encode)
//!     → error.rs (every failure → status + {"error": ...})
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::ApiError;
pub use server::{pipeline, routes, AppState, HttpServer, X_REQUEST_ID};
