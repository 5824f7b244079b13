//! User accounts domain.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → service.rs (register, authenticate, identify)
//!     → update.rs (read, owner check, conditioned write)
//!     → validation.rs (field errors)
//!     → store.rs (UserStore capability, deadline decorator)
//!         → memory.rs | postgres.rs
//! ```

pub mod memory;
pub mod model;
pub mod postgres;
pub mod service;
pub mod store;
pub mod update;
pub mod validation;

pub use memory::MemoryUserStore;
pub use model::{Credentials, Identity, NewUser, RegisterInput, User, UserPatch};
pub use postgres::PgUserStore;
pub use service::{ServiceError, UserService};
pub use store::{DeadlineStore, PoolStats, StoreError, UserStore};
pub use validation::FieldErrors;
