//! Who is shopping.

use std::sync::Arc;

use bestie_core::UserId;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StorageError;
use crate::storage::{LocalStorage, keys};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    user_id: UserId,
}

/// The signed-in user (if any) and the storage the session persists to.
#[derive(Clone)]
pub struct SessionContext {
    storage: Arc<dyn LocalStorage>,
    user_id: Option<UserId>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Restore the persisted session. Unreadable data counts as signed out.
    #[must_use]
    pub fn load(storage: Arc<dyn LocalStorage>) -> Self {
        let user_id = match storage.get(keys::SESSION) {
            Ok(Some(raw)) => match serde_json::from_str::<StoredSession>(&raw) {
                Ok(session) if !session.user_id.as_str().is_empty() => Some(session.user_id),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "Stored session is not valid JSON, signing out");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session");
                None
            }
        };
        Self { storage, user_id }
    }

    /// Signed-out context over `storage`, ignoring any persisted session.
    #[must_use]
    pub fn anonymous(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            user_id: None,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    #[must_use]
    pub fn storage(&self) -> Arc<dyn LocalStorage> {
        Arc::clone(&self.storage)
    }

    /// Record `user_id` as signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted.
    pub fn sign_in(&mut self, user_id: UserId) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&StoredSession {
            user_id: user_id.clone(),
        })?;
        self.storage.set(keys::SESSION, &raw)?;
        self.user_id = Some(user_id);
        Ok(())
    }

    /// Forget the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session cannot be removed.
    pub fn sign_out(&mut self) -> Result<(), StorageError> {
        self.storage.remove(keys::SESSION)?;
        self.user_id = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_sign_in_persists_across_loads() {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());
        let mut context = SessionContext::load(Arc::clone(&storage));
        assert!(context.user_id().is_none());

        context.sign_in(UserId::new("u-1")).unwrap();
        assert_eq!(
            storage.get(keys::SESSION).unwrap().as_deref(),
            Some(r#"{"userId":"u-1"}"#)
        );

        let restored = SessionContext::load(Arc::clone(&storage));
        assert_eq!(restored.user_id(), Some(&UserId::new("u-1")));

        let mut restored = restored;
        restored.sign_out().unwrap();
        assert!(SessionContext::load(storage).user_id().is_none());
    }

    #[test]
    fn test_corrupt_session_is_signed_out() {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());
        storage.set(keys::SESSION, "u-1").unwrap();
        assert!(SessionContext::load(Arc::clone(&storage)).user_id().is_none());

        storage.set(keys::SESSION, r#"{"userId": ""}"#).unwrap();
        assert!(SessionContext::load(storage).user_id().is_none());
    }

    #[test]
    fn test_anonymous_ignores_stored_user() {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());
        storage.set(keys::SESSION, r#"{"userId": "u-1"}"#).unwrap();
        assert!(SessionContext::anonymous(storage).user_id().is_none());
    }
}
