//! Optimistic-concurrency profile update.
//!
//! ```text
//! load by id            → NotFound
//! caller owns record?   → NotPermitted (before the payload is looked at)
//! merge present fields
//! validate              → Validation
//! re-hash new password
//! write if version same → EditConflict | Validation(email) on duplicate
//! ```
//!
//! No retry happens here; a conflict goes back to the client, which
//! re-reads and tries again.

use uuid::Uuid;

use crate::security::PasswordHash;
use crate::users::model::{User, UserPatch};
use crate::users::service::{ServiceError, UserService};
use crate::users::validation::Validator;

impl UserService {
    /// Steps one and two: load the record and check the caller owns it.
    pub async fn load_for_update(&self, caller: &User, id: Uuid) -> Result<User, ServiceError> {
        let user = self.store.get_by_id(id).await?;
        if user.id != caller.id {
            tracing::debug!(caller = %caller.id, target = %id, "Update refused for non-owner");
            return Err(ServiceError::NotPermitted);
        }
        Ok(user)
    }

    /// Merge `patch` into `user` and write it back conditioned on the
    /// version `user` was read at.
    pub async fn apply_update(&self, mut user: User, patch: UserPatch) -> Result<User, ServiceError> {
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(first_name) = patch.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            user.last_name = last_name;
        }

        let mut v = Validator::new();
        v.profile(&user.email, &user.first_name, &user.last_name, patch.password.as_deref());
        v.finish().map_err(ServiceError::Validation)?;

        if let Some(password) = patch.password {
            user.password = PasswordHash::hash_blocking(password).await?;
        }

        let updated = self.store.update(&user).await?;
        tracing::info!(user_id = %updated.id, version = updated.version, "User updated");
        Ok(updated)
    }

    pub async fn update_profile(
        &self,
        caller: &User,
        id: Uuid,
        patch: UserPatch,
    ) -> Result<User, ServiceError> {
        let user = self.load_for_update(caller, id).await?;
        self.apply_update(user, patch).await
    }
}
