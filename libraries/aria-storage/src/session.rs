//! Persisted session/user store
//!
//! Holds the auth token and profile fields. Every mutation is written
//! through to the backing [`KeyValueStore`] so the session survives restarts.

use aria_core::{KeyValueStore, KeyValueStoreExt, LoginInfo, Result, Session};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Storage key for the session document
pub const SESSION_KEY: &str = "session";

/// Session store backed by a key-value store
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    session: Mutex<Session>,
}

impl SessionStore {
    /// Load the persisted session, or start empty
    ///
    /// A corrupt document is logged and replaced by an empty session.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let session = match store.load::<Session>(SESSION_KEY) {
            Ok(Some(session)) => {
                debug!(user_id = %session.user_id, "Restored session");
                session
            }
            Ok(None) => Session::default(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session");
                Session::default()
            }
        };

        Self {
            store,
            session: Mutex::new(session),
        }
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.lock().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    // ===== Getters =====

    pub fn token(&self) -> String {
        self.lock().token.clone()
    }

    pub fn user_id(&self) -> String {
        self.lock().user_id.clone()
    }

    pub fn nickname(&self) -> String {
        self.lock().nickname.clone()
    }

    pub fn avatar(&self) -> String {
        self.lock().avatar.clone()
    }

    // ===== Setters =====

    pub fn set_token(&self, token: impl Into<String>) -> Result<()> {
        self.update(|s| s.token = token.into())
    }

    pub fn set_user_id(&self, user_id: impl Into<String>) -> Result<()> {
        self.update(|s| s.user_id = user_id.into())
    }

    pub fn set_nickname(&self, nickname: impl Into<String>) -> Result<()> {
        self.update(|s| s.nickname = nickname.into())
    }

    pub fn set_avatar(&self, avatar: impl Into<String>) -> Result<()> {
        self.update(|s| s.avatar = avatar.into())
    }

    /// Replace every field from a successful login
    pub fn set_login(&self, login: LoginInfo) -> Result<()> {
        info!(user_id = %login.user_id, "Storing login");
        self.update(|s| *s = Session::from(login))
    }

    // ===== Clears =====

    pub fn clear_token(&self) -> Result<()> {
        self.update(|s| s.token.clear())
    }

    pub fn clear_user_id(&self) -> Result<()> {
        self.update(|s| s.user_id.clear())
    }

    pub fn clear_nickname(&self) -> Result<()> {
        self.update(|s| s.nickname.clear())
    }

    pub fn clear_avatar(&self) -> Result<()> {
        self.update(|s| s.avatar.clear())
    }

    /// Clear every field
    pub fn logout(&self) -> Result<()> {
        info!("Logged out");
        self.update(|s| *s = Session::default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to a copy, persist it, then swap it in
    fn update(&self, f: impl FnOnce(&mut Session)) -> Result<()> {
        let mut session = self.lock();
        let mut next = session.clone();
        f(&mut next);
        self.store.save(SESSION_KEY, &next)?;
        *session = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};
    use tempfile::TempDir;

    fn memory() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    /// Readable store whose writes always fail
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get_raw(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set_raw(&self, _key: &str, _value: &str) -> Result<()> {
            Err(aria_core::CoreError::storage("read-only"))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_keeps_previous_session() {
        let sessions = SessionStore::load(Arc::new(ReadOnlyStore));

        assert!(sessions.set_token("tok").is_err());
        assert!(!sessions.is_authenticated());
        assert_eq!(sessions.session(), Session::default());
    }

    #[test]
    fn test_starts_unauthenticated() {
        let sessions = SessionStore::load(memory());
        assert!(!sessions.is_authenticated());
        assert_eq!(sessions.session(), Session::default());
    }

    #[test]
    fn test_setters_and_paired_clears() {
        let sessions = SessionStore::load(memory());

        sessions.set_token("tok").unwrap();
        sessions.set_user_id("42").unwrap();
        sessions.set_nickname("nick").unwrap();
        sessions.set_avatar("https://a/b.png").unwrap();
        assert!(sessions.is_authenticated());
        assert_eq!(sessions.user_id(), "42");
        assert_eq!(sessions.nickname(), "nick");
        assert_eq!(sessions.avatar(), "https://a/b.png");

        sessions.clear_nickname().unwrap();
        sessions.clear_avatar().unwrap();
        assert_eq!(sessions.nickname(), "");
        assert_eq!(sessions.avatar(), "");
        assert_eq!(sessions.token(), "tok");

        sessions.clear_token().unwrap();
        sessions.clear_user_id().unwrap();
        assert!(!sessions.is_authenticated());
        assert_eq!(sessions.user_id(), "");
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let store = memory();
        let sessions = SessionStore::load(store.clone());

        sessions.set_token("tok").unwrap();
        let saved: Session = store.load(SESSION_KEY).unwrap().unwrap();
        assert_eq!(saved.token, "tok");

        sessions.clear_token().unwrap();
        let saved: Session = store.load(SESSION_KEY).unwrap().unwrap();
        assert_eq!(saved.token, "");
    }

    #[test]
    fn test_session_survives_restart() {
        let dir = TempDir::new().unwrap();
        {
            let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
            let sessions = SessionStore::load(store);
            sessions
                .set_login(LoginInfo {
                    token: "tok".into(),
                    user_id: "7".into(),
                    nickname: "Ann".into(),
                    avatar: String::new(),
                })
                .unwrap();
        }

        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
        let sessions = SessionStore::load(store);
        assert_eq!(sessions.token(), "tok");
        assert_eq!(sessions.nickname(), "Ann");
    }

    #[test]
    fn test_logout_clears_everything() {
        let sessions = SessionStore::load(memory());
        sessions
            .set_login(LoginInfo {
                token: "tok".into(),
                user_id: "7".into(),
                nickname: "Ann".into(),
                avatar: "x".into(),
            })
            .unwrap();

        sessions.logout().unwrap();
        assert_eq!(sessions.session(), Session::default());
    }

    #[test]
    fn test_corrupt_document_starts_empty() {
        let store = memory();
        store.set_raw(SESSION_KEY, "garbage").unwrap();
        let sessions = SessionStore::load(store);
        assert!(!sessions.is_authenticated());
    }
}
