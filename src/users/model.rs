//! User record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::security::PasswordHash;

/// A stored user account.
///
/// `id`, `created_at` and `version` are assigned by the store. The password
/// hash is skipped on serialization.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub password: PasswordHash,
    pub activated: bool,
    pub version: i32,
}

/// Fields supplied at registration; everything else is server-assigned.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: PasswordHash,
    pub activated: bool,
}

impl NewUser {
    /// Materialize the record the way a store does on insert.
    pub fn into_user(self, id: Uuid, created_at: DateTime<Utc>) -> User {
        User {
            id,
            created_at,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password: self.password,
            activated: self.activated,
            version: 1,
        }
    }
}

/// Registration payload.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Login payload.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Caller identity resolved for one request.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    User(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::User(user) => Some(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_user_never_contains_hash() {
        let user = NewUser {
            email: "jon@doe.com".into(),
            first_name: "Jon".into(),
            last_name: "Doe".into(),
            password: PasswordHash::from_stored("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into()),
            activated: true,
        }
        .into_user(Uuid::new_v4(), Utc::now());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "jon@doe.com");
        assert_eq!(json["version"], 1);
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn patch_distinguishes_absent_fields() {
        let patch: UserPatch = serde_json::from_str(r#"{"first_name": "Nina"}"#).unwrap();
        assert_eq!(patch.first_name.as_deref(), Some("Nina"));
        assert!(patch.email.is_none());
        assert!(patch.password.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<UserPatch>(r#"{"id": "x"}"#).is_err());
        assert!(serde_json::from_str::<RegisterInput>(r#"{"version": 5}"#).is_err());
    }
}
