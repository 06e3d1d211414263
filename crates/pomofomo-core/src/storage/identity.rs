//! Signed-in user kept in the local database.
//!
//! Stands in for a remote identity provider: `sign_in` stores an opaque
//! user id under the `current_user` key, `sign_out` removes it.

use std::sync::Arc;

use async_trait::async_trait;

use super::Database;
use crate::error::{Result, StoreError, ValidationError};
use crate::session::{Identity, UserId};

const CURRENT_USER_KEY: &str = "current_user";

pub struct StoredIdentity {
    db: Arc<Database>,
}

impl StoredIdentity {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// # Errors
    /// Returns an error if the id is blank or the kv write fails.
    pub fn sign_in(&self, user_id: &str) -> Result<UserId> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "user_id".into(),
                message: "must not be empty".into(),
            }
            .into());
        }
        self.db.kv_set(CURRENT_USER_KEY, user_id)?;
        tracing::info!(user = user_id, "signed in");
        Ok(UserId::new(user_id))
    }

    /// Returns whether somebody was signed in.
    pub fn sign_out(&self) -> Result<bool, StoreError> {
        let removed = self.db.kv_delete(CURRENT_USER_KEY)?;
        if removed {
            tracing::info!("signed out");
        }
        Ok(removed)
    }

    pub fn user(&self) -> Result<Option<UserId>, StoreError> {
        Ok(self.db.kv_get(CURRENT_USER_KEY)?.map(UserId::new))
    }
}

#[async_trait]
impl Identity for StoredIdentity {
    async fn current_user(&self) -> Result<Option<UserId>, StoreError> {
        self.user().inspect_err(|e| {
            tracing::warn!(error = %e, "could not resolve signed-in user");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_and_out() {
        let identity = StoredIdentity::new(Arc::new(Database::open_memory().unwrap()));
        assert_eq!(identity.current_user().await.unwrap(), None);

        identity.sign_in("  alice ").unwrap();
        assert_eq!(identity.current_user().await.unwrap(), Some(UserId::new("alice")));

        assert!(identity.sign_out().unwrap());
        assert!(!identity.sign_out().unwrap());
        assert_eq!(identity.current_user().await.unwrap(), None);
    }

    #[test]
    fn blank_user_is_rejected() {
        let identity = StoredIdentity::new(Arc::new(Database::open_memory().unwrap()));
        assert!(identity.sign_in("   ").is_err());
        assert_eq!(identity.user().unwrap(), None);
    }
}
