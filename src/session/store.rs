//! Session store: the in-memory session derived from durable storage.
//!
//! ARCHITECTURE
//! ============
//! Durable storage is the source of truth. `load` derives the in-memory
//! `Session` from it at startup and every writer (`login`, `logout`,
//! `clear_if_token`) updates storage first, then swaps the whole `Session`
//! value under a lock. Readers clone the current value and never observe a
//! token without its user or the reverse.
//!
//! ERROR HANDLING
//! ==============
//! Storage failures are logged and swallowed: the store keeps working
//! in-memory only and the session is lost on restart. A malformed persisted
//! user is treated as absent while the token is kept, which leaves the
//! session authenticated-but-hydrating.

use std::sync::{Mutex, PoisonError, RwLock};

use super::storage::{FileStorage, MemoryStorage, SessionStorage};
use super::user::User;
use crate::config::StorageLocation;

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

/// Storage key holding the bearer credential.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the serialized user profile.
pub const USER_KEY: &str = "user";

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    /// The only authentication predicate in the crate: a token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Token present but profile not yet in memory.
    #[must_use]
    pub fn needs_hydration(&self) -> bool {
        self.token.is_some() && self.user.is_none()
    }
}

pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    state: RwLock<Session>,
    // Serializes writers so storage and memory are updated in the same order.
    writer: Mutex<()>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.snapshot();
        f.debug_struct("SessionStore")
            .field("authenticated", &session.is_authenticated())
            .field("user_loaded", &session.user.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Build a store over `storage`, hydrating the in-memory session from it.
    pub fn load(storage: impl SessionStorage + 'static) -> Self {
        let storage: Box<dyn SessionStorage> = Box::new(storage);
        let session = read_persisted(storage.as_ref());
        tracing::debug!(
            authenticated = session.is_authenticated(),
            user_loaded = session.user.is_some(),
            "session loaded"
        );
        Self { storage, state: RwLock::new(session), writer: Mutex::new(()) }
    }

    /// Build a store over the configured storage location.
    #[must_use]
    pub fn open(location: &StorageLocation) -> Self {
        match location {
            StorageLocation::File(path) => Self::load(FileStorage::new(path.clone())),
            StorageLocation::Memory => Self::in_memory(),
        }
    }

    /// Store without durable persistence.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::load(MemoryStorage::new())
    }

    /// Record a successful login: persist both fields, then publish them
    /// together.
    pub fn login(&self, token: impl Into<String>, user: User) {
        let token = token.into();
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        match serde_json::to_string(&user) {
            Ok(user_json) => {
                if let Err(e) = self.storage.apply(&[(TOKEN_KEY, &token), (USER_KEY, &user_json)], &[]) {
                    tracing::warn!(error = %e, "session storage unavailable; session kept in memory only");
                }
            }
            Err(e) => tracing::warn!(error = %e, "user profile not serializable; session kept in memory only"),
        }

        self.replace(Session { token: Some(token), user: Some(user) });
        tracing::info!("session started");
    }

    /// Clear the session locally. Safe to call when already signed out.
    pub fn logout(&self) {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.clear_locked();
    }

    /// Clear the session only if `token` is still the current credential.
    ///
    /// Returns `true` when the session was cleared. A response that belongs
    /// to an older session must not end a newer one.
    pub fn clear_if_token(&self, token: &str) -> bool {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if self.read().token.as_deref() != Some(token) {
            return false;
        }
        self.clear_locked();
        true
    }

    /// Reload the user profile from durable storage when the token is present
    /// but the profile is not in memory.
    ///
    /// Returns the in-memory user after the attempt.
    pub fn hydrate_user(&self) -> Option<User> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot();
        if !current.needs_hydration() {
            return current.user;
        }

        let persisted = read_persisted(self.storage.as_ref());
        if persisted.token != current.token {
            tracing::debug!("persisted session differs from memory; skipping hydration");
            return None;
        }
        let user = persisted.user?;
        self.replace(Session { token: current.token, user: Some(user.clone()) });
        tracing::debug!(user_id = %user.id, "user hydrated from storage");
        Some(user)
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    fn clear_locked(&self) {
        if let Err(e) = self.storage.apply(&[], &[TOKEN_KEY, USER_KEY]) {
            tracing::warn!(error = %e, "failed to erase persisted session");
        }
        let was_authenticated = self.read().is_authenticated();
        self.replace(Session::default());
        if was_authenticated {
            tracing::info!("session cleared");
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace(&self, session: Session) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = session;
    }
}

fn read_persisted(storage: &dyn SessionStorage) -> Session {
    let token = match storage.get(TOKEN_KEY) {
        Ok(token) => token.filter(|t| !t.is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, "session storage unreadable; starting signed out");
            return Session::default();
        }
    };
    // A stray profile without a token is never exposed.
    if token.is_none() {
        return Session::default();
    }

    let user = match storage.get(USER_KEY) {
        Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "persisted user is malformed; treating as absent");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "persisted user unreadable; treating as absent");
            None
        }
    };

    Session { token, user }
}
