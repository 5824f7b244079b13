//! User account service library.
//!
//! Registration, password login with bearer tokens, and optimistic
//! concurrency profile updates behind a fixed request pipeline.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod users;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
