//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms via the metrics facade,
//!                   plus in-process request stats for /debug/vars)
//!
//! Consumers:
//!     → stdout (JSON or pretty)
//!     → Prometheus scrape endpoint (optional)
//!     → GET /debug/vars
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every request span
//! - Metric updates are atomic increments

pub mod logging;
pub mod metrics;

pub use metrics::{RequestStats, RequestStatsSnapshot};
