//! Session Store
//!
//! Holds the bearer token and user profile for the logged-in account,
//! persisted as JSON so the CLI keeps its session between invocations.
//! There is exactly one teardown path: `clear()`, invoked on logout and
//! on an unauthorized response.

use crate::model::{User, UserRole};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// Persisted session payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Durable token/user storage with an in-memory mirror.
pub struct SessionStore {
    path: PathBuf,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Open the store, loading any previously persisted session.
    ///
    /// A missing file means "not logged in"; a corrupt file is treated
    /// the same way rather than failing every subsequent request.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable session file {:?}: {}", path, e);
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            path,
            current: RwLock::new(current),
        }
    }

    /// Store a new session and persist it.
    pub fn store(&self, session: Session) -> Result<(), SessionError> {
        self.write_file(&session)?;
        *self.current.write().expect("session lock poisoned") = Some(session);
        Ok(())
    }

    /// Tear down the session: forget it in memory and remove the file.
    pub fn clear(&self) {
        *self.current.write().expect("session lock poisoned") = None;
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove session file {:?}: {}", self.path, e);
            }
        }
    }

    /// Current bearer token, if logged in.
    pub fn token(&self) -> Option<String> {
        self.current
            .read()
            .expect("session lock poisoned")
            .as_ref()
            .map(|s| s.token.clone())
    }

    /// Profile of the logged-in user.
    pub fn user(&self) -> Option<User> {
        self.current
            .read()
            .expect("session lock poisoned")
            .as_ref()
            .map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user().map(|u| u.role == UserRole::Admin).unwrap_or(false)
    }

    /// Admins and managers may create/update/delete records.
    pub fn can_edit(&self) -> bool {
        self.user()
            .map(|u| matches!(u.role, UserRole::Admin | UserRole::Manager))
            .unwrap_or(false)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::Io {
                path: self.path.clone(),
                error: e.to_string(),
            })?;
        }
        let content = serde_json::to_string_pretty(session).map_err(SessionError::Serialize)?;
        std::fs::write(&self.path, content).map_err(|e| SessionError::Io {
            path: self.path.clone(),
            error: e.to_string(),
        })
    }
}

/// Errors from session persistence
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to write session file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session(role: UserRole) -> Session {
        Session {
            token: "tok-123".into(),
            user: User {
                id: "u1".into(),
                username: "operator".into(),
                email: None,
                role,
                created_at: None,
            },
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::open(&path);
        assert!(!store.is_authenticated());

        store.store(sample_session(UserRole::Manager)).unwrap();
        assert_eq!(store.token().as_deref(), Some("tok-123"));
        assert!(store.can_edit());
        assert!(!store.is_admin());

        // A fresh store picks the session back up from disk
        let reopened = SessionStore::open(&path);
        assert!(reopened.is_authenticated());
        assert_eq!(reopened.user().unwrap().username, "operator");
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::open(&path);
        store.store(sample_session(UserRole::Admin)).unwrap();
        assert!(path.exists());

        store.clear();
        assert!(!store.is_authenticated());
        assert!(!path.exists());

        // Clearing twice is harmless
        store.clear();
    }

    #[test]
    fn test_corrupt_file_means_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = SessionStore::open(&path);
        assert!(!store.is_authenticated());
    }
}
