//! Session and account bookkeeping.
//!
//! Auth here is a local placeholder, not a credential system: registered
//! accounts are plaintext `{email, password}` pairs in a persisted list and
//! the session is whichever user document is currently stored. Gated views
//! rely only on the observable behavior of [`SessionStore::is_authenticated`].

use crate::storage::{self, REGISTERED_USERS_KEY, Storage, USER_KEY};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Fixed identity produced by guest login; every guest session shares it.
pub const GUEST_EMAIL: &str = "guest@briefcast.app";
pub const GUEST_DISPLAY_NAME: &str = "Guest User";

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

static RE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// The currently signed-in identity. Field names stay camelCase on disk to
/// match previously persisted session documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub is_guest: bool,
    #[serde(default)]
    pub is_premium: bool,
}

impl User {
    /// Identity for a registered account; the display name is the local part
    /// of the email.
    pub fn registered(email: &str) -> Self {
        let display_name = email.split('@').next().unwrap_or(email).to_string();
        User {
            email: email.to_string(),
            display_name,
            is_guest: false,
            is_premium: false,
        }
    }

    pub fn guest() -> Self {
        User {
            email: GUEST_EMAIL.to_string(),
            display_name: GUEST_DISPLAY_NAME.to_string(),
            is_guest: true,
            is_premium: false,
        }
    }

    /// Plan label shown on the settings view.
    pub fn plan_label(&self) -> &'static str {
        if self.is_premium { "Premium" } else { "Basic" }
    }
}

/// Plaintext credential pair in the registered-users list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Errors surfaced inline on the auth form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Short password")]
    ShortPassword,
    #[error("User not found")]
    UserNotFound,
}

/// Store for the current session and the registered-users list.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        SessionStore { storage }
    }

    pub fn current_user(&self) -> Option<User> {
        storage::read_json(self.storage.as_ref(), USER_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Overwrites any existing session unconditionally.
    pub fn login(&self, user: &User) {
        storage::write_json(self.storage.as_ref(), USER_KEY, user);
        info!(email = %user.email, guest = user.is_guest, "Signed in");
    }

    /// Clears the session only; saved and finished books survive.
    pub fn logout(&self) {
        self.storage.remove(USER_KEY);
        debug!("Session cleared");
    }

    pub fn login_as_guest(&self) -> User {
        let user = User::guest();
        self.login(&user);
        user
    }

    /// Validates, appends the plaintext pair to the registered list, and
    /// signs the new account in. Email shape is checked before password
    /// length.
    pub fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if !RE_EMAIL.is_match(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::ShortPassword);
        }
        let mut registered = self.registered_users();
        registered.push(Credentials {
            email: email.to_string(),
            password: password.to_string(),
        });
        storage::write_json(self.storage.as_ref(), REGISTERED_USERS_KEY, &registered);
        let user = User::registered(email);
        self.login(&user);
        Ok(user)
    }

    /// Exact-match lookup against the registered list.
    pub fn login_with_credentials(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if !RE_EMAIL.is_match(email) {
            return Err(AuthError::InvalidEmail);
        }
        let known = self
            .registered_users()
            .iter()
            .any(|c| c.email == email && c.password == password);
        if !known {
            return Err(AuthError::UserNotFound);
        }
        let user = User::registered(email);
        self.login(&user);
        Ok(user)
    }

    /// Re-persists the current user with the premium flag set. Returns the
    /// updated user, or `None` when signed out.
    pub fn upgrade_to_premium(&self) -> Option<User> {
        let mut user = self.current_user()?;
        user.is_premium = true;
        storage::write_json(self.storage.as_ref(), USER_KEY, &user);
        info!(email = %user.email, "Upgraded to premium");
        Some(user)
    }

    pub fn registered_users(&self) -> Vec<Credentials> {
        storage::read_json(self.storage.as_ref(), REGISTERED_USERS_KEY).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FINISHED_KEY, LIBRARY_KEY, MemoryStorage};

    fn build_store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        (storage, store)
    }

    #[test]
    fn register_logout_login_round_trip() {
        let (_, store) = build_store();
        store.register("reader@example.com", "secret1").unwrap();
        store.logout();
        assert!(!store.is_authenticated());

        let user = store
            .login_with_credentials("reader@example.com", "secret1")
            .unwrap();
        assert_eq!(user.display_name, "reader");
        assert!(!user.is_guest);
        assert_eq!(store.current_user(), Some(user));
    }

    #[test]
    fn short_password_leaves_registered_list_unchanged() {
        let (_, store) = build_store();
        let err = store.register("reader@example.com", "abc").unwrap_err();
        assert_eq!(err, AuthError::ShortPassword);
        assert!(store.registered_users().is_empty());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn email_shape_is_checked_before_password_length() {
        let (_, store) = build_store();
        let err = store.register("not-an-email", "abc").unwrap_err();
        assert_eq!(err, AuthError::InvalidEmail);
    }

    #[test]
    fn unknown_credentials_fail_with_user_not_found() {
        let (_, store) = build_store();
        store.register("reader@example.com", "secret1").unwrap();
        let err = store
            .login_with_credentials("reader@example.com", "wrong-pass")
            .unwrap_err();
        assert_eq!(err, AuthError::UserNotFound);
    }

    #[test]
    fn guest_login_always_yields_the_same_identity() {
        let (_, store) = build_store();
        let first = store.login_as_guest();
        store.logout();
        let second = store.login_as_guest();
        assert_eq!(first, second);
        assert_eq!(first.email, GUEST_EMAIL);
        assert!(first.is_guest);
    }

    #[test]
    fn login_overwrites_existing_session() {
        let (_, store) = build_store();
        store.login_as_guest();
        store.register("reader@example.com", "secret1").unwrap();
        let current = store.current_user().unwrap();
        assert_eq!(current.email, "reader@example.com");
    }

    #[test]
    fn logout_leaves_other_documents_alone() {
        let (storage, store) = build_store();
        storage.write(LIBRARY_KEY, r#"[{"id":"b1"}]"#);
        storage.write(FINISHED_KEY, r#"[{"id":"b2"}]"#);
        store.login_as_guest();
        store.logout();
        assert_eq!(storage.read(LIBRARY_KEY).as_deref(), Some(r#"[{"id":"b1"}]"#));
        assert_eq!(storage.read(FINISHED_KEY).as_deref(), Some(r#"[{"id":"b2"}]"#));
        assert!(storage.read(USER_KEY).is_none());
    }

    #[test]
    fn duplicate_registration_appends_again() {
        let (_, store) = build_store();
        store.register("reader@example.com", "secret1").unwrap();
        store.register("reader@example.com", "secret1").unwrap();
        assert_eq!(store.registered_users().len(), 2);
    }

    #[test]
    fn premium_upgrade_persists_on_the_session() {
        let (_, store) = build_store();
        store.register("reader@example.com", "secret1").unwrap();
        let upgraded = store.upgrade_to_premium().unwrap();
        assert!(upgraded.is_premium);
        assert!(store.current_user().unwrap().is_premium);
        assert_eq!(upgraded.plan_label(), "Premium");
    }

    #[test]
    fn premium_upgrade_requires_a_session() {
        let (_, store) = build_store();
        assert!(store.upgrade_to_premium().is_none());
    }

    #[test]
    fn corrupt_session_document_reads_as_signed_out() {
        let (storage, store) = build_store();
        storage.write(USER_KEY, "{ definitely broken");
        assert!(store.current_user().is_none());
        assert!(!store.is_authenticated());
    }
}
