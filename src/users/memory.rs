//! In-process user store.
//!
//! Used by tests and by the binary when no database DSN is configured.
//! A single mutex guards both the records and the email index, so the
//! uniqueness check and the version compare-and-swap are each one step.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::users::model::{NewUser, User};
use crate::users::store::{StoreError, UserStore};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>,
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    tables: Mutex<Tables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock cannot leave the maps half-written:
        // every mutation below completes before any fallible step.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.lock();
        if tables.emails.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let record = user.into_user(Uuid::new_v4(), Utc::now());
        tables.emails.insert(record.email.clone(), record.id);
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        self.lock().users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let tables = self.lock();
        tables
            .emails
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut tables = self.lock();

        let (current_email, current_version) = match tables.users.get(&user.id) {
            Some(current) => (current.email.clone(), current.version),
            None => return Err(StoreError::EditConflict),
        };
        if current_version != user.version {
            return Err(StoreError::EditConflict);
        }
        if current_email != user.email {
            if tables.emails.contains_key(&user.email) {
                return Err(StoreError::DuplicateEmail);
            }
            tables.emails.remove(&current_email);
            tables.emails.insert(user.email.clone(), user.id);
        }

        let mut updated = user.clone();
        updated.version = current_version + 1;
        tables.users.insert(updated.id, updated.clone());
        Ok(updated)
    }
}
