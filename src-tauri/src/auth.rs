//! Local mock authentication.
//!
//! Users live unencrypted under the `users` key and the signed-in session
//! under `currentUser`. Nothing here is meant to protect anything.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuditError, AuthError};
use crate::storage::{
    load_list, load_value, save_json, SharedStore, CURRENT_USER_KEY, USERS_KEY,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Admin => "admin",
            Self::User => "user",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// The pruned record kept for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&UserRecord> for SessionUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

pub fn default_users() -> Vec<UserRecord> {
    vec![
        UserRecord {
            id: "1".to_string(),
            name: "Admin User".to_string(),
            email: "admin@example.com".to_string(),
            password: "admin123".to_string(),
            role: Role::Admin,
        },
        UserRecord {
            id: "2".to_string(),
            name: "Test User".to_string(),
            email: "user@example.com".to_string(),
            password: "user123".to_string(),
            role: Role::User,
        },
    ]
}

pub struct AuthShim {
    store: SharedStore,
    current: Option<SessionUser>,
}

impl AuthShim {
    /// Restores any stored session. With `seed_defaults`, writes the demo
    /// users when no user list has ever been stored.
    pub fn init(store: SharedStore, seed_defaults: bool) -> Result<Self, AuditError> {
        if seed_defaults && store.get(USERS_KEY)?.is_none() {
            save_json(store.as_ref(), USERS_KEY, &default_users())?;
            tracing::info!("default users initialized");
        }
        let current = load_value(store.as_ref(), CURRENT_USER_KEY);
        Ok(Self { store, current })
    }

    pub fn current_user(&self) -> Option<&SessionUser> {
        self.current.as_ref()
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let users: Vec<UserRecord> = load_list(self.store.as_ref(), USERS_KEY);
        let user = users
            .iter()
            .find(|user| user.email == email && user.password == password)
            .ok_or(AuthError::InvalidCredentials)?;
        let session = SessionUser::from(user);
        self.start_session(session.clone())?;
        tracing::info!(email, "user logged in");
        Ok(session)
    }

    /// Adds a `user`-role account and signs it in.
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, AuthError> {
        if name.trim().is_empty() {
            return Err(AuthError::NameRequired);
        }
        let mut users: Vec<UserRecord> = load_list(self.store.as_ref(), USERS_KEY);
        if users.iter().any(|user| user.email == email) {
            return Err(AuthError::EmailTaken);
        }
        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Role::User,
        };
        let session = SessionUser::from(&user);
        users.push(user);
        save_json(self.store.as_ref(), USERS_KEY, &users)?;
        self.start_session(session.clone())?;
        tracing::info!(email, "user registered");
        Ok(session)
    }

    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.store.remove(CURRENT_USER_KEY)?;
        self.current = None;
        Ok(())
    }

    fn start_session(&mut self, session: SessionUser) -> Result<(), AuthError> {
        save_json(self.store.as_ref(), CURRENT_USER_KEY, &session)?;
        self.current = Some(session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn shim() -> (SharedStore, AuthShim) {
        let shared: SharedStore = Arc::new(MemoryStore::new());
        let auth = AuthShim::init(shared.clone(), true).unwrap();
        (shared, auth)
    }

    #[test]
    fn seeds_defaults_only_once() {
        let (shared, _) = shim();
        let users: Vec<UserRecord> = load_list(shared.as_ref(), USERS_KEY);
        assert_eq!(users, default_users());

        save_json(shared.as_ref(), USERS_KEY, &Vec::<UserRecord>::new()).unwrap();
        AuthShim::init(shared.clone(), true).unwrap();
        let users: Vec<UserRecord> = load_list(shared.as_ref(), USERS_KEY);
        assert!(users.is_empty());
    }

    #[test]
    fn login_requires_exact_match_and_prunes_session() {
        let (shared, mut auth) = shim();
        assert_eq!(
            auth.login("admin@example.com", "ADMIN123"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.login("Admin@example.com", "admin123"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(auth.current_user(), None);

        let session = auth.login("admin@example.com", "admin123").unwrap();
        assert_eq!(
            session,
            SessionUser {
                name: "Admin User".to_string(),
                email: "admin@example.com".to_string(),
                role: Role::Admin,
            }
        );
        let stored = shared.get(CURRENT_USER_KEY).unwrap().unwrap();
        assert!(!stored.contains("password"));

        let restored = AuthShim::init(shared, true).unwrap();
        assert_eq!(restored.current_user(), Some(&session));
    }

    #[test]
    fn register_appends_user_and_signs_in() {
        let (shared, mut auth) = shim();
        let session = auth.register("Dana", "dana@example.com", "pw").unwrap();
        assert_eq!(session.role, Role::User);
        assert_eq!(auth.current_user(), Some(&session));

        let users: Vec<UserRecord> = load_list(shared.as_ref(), USERS_KEY);
        assert_eq!(users.len(), 3);
        assert_eq!(users[2].password, "pw");

        auth.logout().unwrap();
        assert_eq!(auth.login("dana@example.com", "pw").unwrap(), session);
    }

    #[test]
    fn register_rejects_duplicate_email_and_blank_name() {
        let (_, mut auth) = shim();
        assert_eq!(
            auth.register("Someone", "user@example.com", "x"),
            Err(AuthError::EmailTaken)
        );
        assert_eq!(
            auth.register("  ", "new@example.com", "x"),
            Err(AuthError::NameRequired)
        );
        assert_eq!(auth.current_user(), None);
    }

    #[test]
    fn logout_clears_session() {
        let (shared, mut auth) = shim();
        auth.login("user@example.com", "user123").unwrap();
        auth.logout().unwrap();
        assert_eq!(auth.current_user(), None);
        assert_eq!(shared.get(CURRENT_USER_KEY).unwrap(), None);
    }
}
