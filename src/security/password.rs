//! Password hashing with Argon2id.
//!
//! Hashing is CPU bound, so the async entry points hop onto the blocking pool.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::fmt;

/// A salted one-way password hash in PHC string format.
///
/// The only ways to obtain one are hashing a plaintext or loading a stored
/// hash, so a user record can never exist without a hash.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(password_hash::Error),
    #[error("stored password hash is malformed: {0}")]
    Malformed(password_hash::Error),
    #[error("password worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl PasswordHash {
    /// Wrap a hash read back from storage.
    pub fn from_stored(phc: String) -> Self {
        Self(phc)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash `plaintext` with a fresh random salt.
    pub fn hash(plaintext: &str) -> Result<Self, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(PasswordError::Hash)?;
        Ok(Self(hash.to_string()))
    }

    /// Check `plaintext` against this hash. A mismatch is `Ok(false)`.
    pub fn matches(&self, plaintext: &str) -> Result<bool, PasswordError> {
        let parsed = password_hash::PasswordHash::new(&self.0).map_err(PasswordError::Malformed)?;
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Hash(e)),
        }
    }

    /// [`PasswordHash::hash`] on the blocking pool.
    pub async fn hash_blocking(plaintext: String) -> Result<Self, PasswordError> {
        tokio::task::spawn_blocking(move || Self::hash(&plaintext)).await?
    }

    /// [`PasswordHash::matches`] on the blocking pool.
    pub async fn matches_blocking(&self, plaintext: String) -> Result<bool, PasswordError> {
        let hash = self.clone();
        tokio::task::spawn_blocking(move || hash.matches(&plaintext)).await?
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}
