//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rates > 0, pool sizes > 0, timeouts > 0)
//! - Refuse the placeholder signing secret in production
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::{Environment, ServiceConfig, DEFAULT_AUTH_SECRET};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending setting.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint and report all violations.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.secret.is_empty() {
        errors.push(ValidationError::new("auth.secret", "must be provided"));
    } else if config.environment == Environment::Production
        && config.auth.secret == DEFAULT_AUTH_SECRET
    {
        errors.push(ValidationError::new(
            "auth.secret",
            "the default secret is not allowed in production",
        ));
    }

    if config.rate_limit.enabled {
        let rps = config.rate_limit.requests_per_second;
        if !rps.is_finite() || rps <= 0.0 {
            errors.push(ValidationError::new(
                "rate_limit.requests_per_second",
                "must be a positive number",
            ));
        }
        if config.rate_limit.burst_size == 0 {
            errors.push(ValidationError::new("rate_limit.burst_size", "must be at least 1"));
        }
        if config.rate_limit.sweep_interval_secs == 0 {
            errors.push(ValidationError::new(
                "rate_limit.sweep_interval_secs",
                "must be greater than zero",
            ));
        }
    }

    if config.database.max_open_conns == 0 {
        errors.push(ValidationError::new("database.max_open_conns", "must be at least 1"));
    }
    if let Err(e) = config.database.idle_timeout() {
        errors.push(ValidationError::new(
            "database.max_idle_time",
            format!("invalid duration '{}': {}", config.database.max_idle_time, e),
        ));
    }

    if config.timeouts.store_secs == 0 {
        errors.push(ValidationError::new("timeouts.store_secs", "must be greater than zero"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    for origin in &config.cors.trusted_origins {
        if origin.trim().is_empty() {
            errors.push(ValidationError::new("cors.trusted_origins", "must not contain blank entries"));
            break;
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
