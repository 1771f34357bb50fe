//! Mock session store.
//!
//! # Design
//! A fixture, not a security boundary: two hardcoded credential pairs,
//! no hashing, no token issuance. The signed-in user lives in memory and is
//! mirrored as JSON under [`USER_KEY`]. `SessionStore::open` rehydrates it;
//! a value that fails to parse is purged so the next start is clean.
//!
//! The store is an explicit object passed by reference to whatever needs the
//! session, rather than ambient global state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{Capabilities, Capability, Role};
use crate::storage::{Storage, USER_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

struct MockAccount {
    email: &'static str,
    password: &'static str,
    id: &'static str,
    name: &'static str,
    role: Role,
}

const MOCK_ACCOUNTS: [MockAccount; 2] = [
    MockAccount {
        email: "admin@example.com",
        password: "admin",
        id: "1",
        name: "Admin User",
        role: Role::Admin,
    },
    MockAccount {
        email: "user@example.com",
        password: "password",
        id: "2",
        name: "Regular User",
        role: Role::Student,
    },
];

pub struct SessionStore {
    storage: Arc<dyn Storage>,
    user: Option<SessionUser>,
}

impl SessionStore {
    /// Open the store and rehydrate any persisted user.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let user = rehydrate(storage.as_ref());
        if let Some(user) = &user {
            tracing::info!(user_id = %user.id, role = %user.role, "session restored");
        }
        Self { storage, user }
    }

    /// Release the store. The persisted user stays in storage for the next
    /// `open`.
    pub fn close(self) {
        tracing::debug!(signed_in = self.user.is_some(), "session store closed");
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.user
            .as_ref()
            .map(|u| u.role.capabilities())
            .unwrap_or_default()
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(capability)
    }

    /// Sign in with one of the fixture accounts. Unknown credentials leave
    /// the store and storage untouched.
    pub fn login(&mut self, email: &str, password: &str) -> bool {
        let Some(account) = MOCK_ACCOUNTS
            .iter()
            .find(|a| a.email == email && a.password == password)
        else {
            tracing::info!(%email, "login rejected");
            return false;
        };
        self.sign_in(SessionUser {
            id: account.id.to_string(),
            email: account.email.to_string(),
            name: account.name.to_string(),
            role: account.role,
            avatar: None,
        })
    }

    /// Create a student account for any email and sign it in.
    pub fn signup(&mut self, email: &str, _password: &str, name: &str) -> bool {
        let id: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
        self.sign_in(SessionUser {
            id,
            email: email.to_string(),
            name: name.to_string(),
            role: Role::Student,
            avatar: None,
        })
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!(user_id = %user.id, "signed out");
        }
        if let Err(e) = self.storage.remove(USER_KEY) {
            tracing::warn!(error = %e, "failed to remove stored user");
        }
    }

    fn sign_in(&mut self, user: SessionUser) -> bool {
        let persisted = serde_json::to_string(&user)
            .map_err(|e| e.to_string())
            .and_then(|json| self.storage.set(USER_KEY, &json).map_err(|e| e.to_string()));
        if let Err(e) = persisted {
            tracing::warn!(error = %e, "failed to persist session user");
            return false;
        }
        tracing::info!(user_id = %user.id, role = %user.role, "signed in");
        self.user = Some(user);
        true
    }
}

fn rehydrate(storage: &dyn Storage) -> Option<SessionUser> {
    let raw = match storage.get(USER_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(error = %e, "stored user unreadable");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!(error = %e, "discarding corrupt stored user");
            if let Err(e) = storage.remove(USER_KEY) {
                tracing::warn!(error = %e, "failed to remove corrupt stored user");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStorage;

    fn store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let session = SessionStore::open(storage.clone());
        (storage, session)
    }

    #[test]
    fn admin_login() {
        let (storage, mut session) = store();
        assert!(session.login("admin@example.com", "admin"));
        let user = session.user().unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.name, "Admin User");
        assert!(session.is_authenticated());
        assert!(session.can(Capability::ManageUsers));
        assert!(storage.get(USER_KEY).unwrap().is_some());
    }

    #[test]
    fn student_login() {
        let (_, mut session) = store();
        assert!(session.login("user@example.com", "password"));
        assert_eq!(session.user().unwrap().role, Role::Student);
        assert!(!session.can(Capability::AdminPanel));
    }

    #[test]
    fn wrong_credentials_change_nothing() {
        let (storage, mut session) = store();
        assert!(!session.login("wrong@example.com", "x"));
        assert!(!session.login("admin@example.com", "password"));
        assert!(session.user().is_none());
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn failed_login_keeps_existing_session() {
        let (_, mut session) = store();
        session.login("user@example.com", "password");
        assert!(!session.login("admin@example.com", "nope"));
        assert_eq!(session.user().unwrap().email, "user@example.com");
    }

    #[test]
    fn signup_creates_student() {
        let (_, mut session) = store();
        assert!(session.signup("new@example.com", "pw", "New Person"));
        let user = session.user().unwrap();
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.name, "New Person");
        assert_eq!(user.id.len(), 9);
    }

    #[test]
    fn logout_clears_memory_and_storage() {
        let (storage, mut session) = store();
        session.login("admin@example.com", "admin");
        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.capabilities().is_empty());
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn rehydrates_identical_user() {
        let (storage, mut session) = store();
        session.login("admin@example.com", "admin");
        let before = session.user().cloned();
        session.close();

        let reopened = SessionStore::open(storage);
        assert_eq!(reopened.user().cloned(), before);
    }

    #[test]
    fn avatar_survives_roundtrip() {
        let storage = Arc::new(MemoryStorage::new());
        let user = SessionUser {
            id: "3".into(),
            email: "v@example.com".into(),
            name: "Vol".into(),
            role: Role::Volunteer,
            avatar: Some("https://example.com/a.png".into()),
        };
        storage.set(USER_KEY, &serde_json::to_string(&user).unwrap()).unwrap();
        let session = SessionStore::open(storage);
        assert_eq!(session.user(), Some(&user));
    }

    #[test]
    fn corrupt_value_is_purged() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(USER_KEY, "{not json").unwrap();
        let session = SessionStore::open(storage.clone());
        assert!(session.user().is_none());
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }

    struct ReadOnlyStorage;

    impl Storage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io("read-only".into()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn persist_failure_rejects_login() {
        let mut session = SessionStore::open(Arc::new(ReadOnlyStorage));
        assert!(!session.login("admin@example.com", "admin"));
        assert!(session.user().is_none());
    }
}
