//! Field validation for user input.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

pub const PASSWORD_MIN_BYTES: usize = 8;
pub const PASSWORD_MAX_BYTES: usize = 72;

/// Client-fixable problems keyed by field name. First error per field wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Accumulates field errors across checks.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.errors.add(field, message);
        }
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    pub fn email(&mut self, email: &str) {
        self.check(!email.is_empty(), "email", "must be provided");
        self.check(EMAIL_RX.is_match(email), "email", "must be a valid email address");
    }

    pub fn password(&mut self, password: &str) {
        self.check(!password.is_empty(), "password", "must be provided");
        self.check(
            password.len() >= PASSWORD_MIN_BYTES,
            "password",
            "must be at least 8 bytes long",
        );
        self.check(
            password.len() <= PASSWORD_MAX_BYTES,
            "password",
            "must not be more than 72 bytes long",
        );
    }

    pub fn first_name(&mut self, name: &str) {
        self.check(!name.trim().is_empty(), "first_name", "must be provided");
    }

    pub fn last_name(&mut self, name: &str) {
        self.check(!name.trim().is_empty(), "last_name", "must be provided");
    }

    /// Profile fields plus, when one was supplied, the new plaintext password.
    pub fn profile(&mut self, email: &str, first_name: &str, last_name: &str, password: Option<&str>) {
        self.email(email);
        self.first_name(first_name);
        self.last_name(last_name);
        if let Some(password) = password {
            self.password(password);
        }
    }
}
