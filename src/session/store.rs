//! Session storage backends

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::User;

/// Session persistence errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Token plus the serialized user it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub user: User,
}

/// Process-wide session state.
///
/// Initialized on login, torn down on logout or on any 401 from the API.
pub trait SessionStore: Send + Sync {
    /// Current bearer token, if a session exists
    fn token(&self) -> Option<String>;

    /// User stored alongside the token
    fn user(&self) -> Option<User>;

    fn set_session(&self, token: &str, user: &User) -> Result<(), SessionError>;

    fn clear_session(&self);

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Session held only for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RwLock<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start already logged in
    pub fn with_session(token: impl Into<String>, user: User) -> Self {
        Self {
            inner: RwLock::new(Some(StoredSession {
                token: token.into(),
                user,
            })),
        }
    }

    fn read(&self) -> Option<StoredSession> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<StoredSession>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<String> {
        self.read().map(|s| s.token)
    }

    fn user(&self) -> Option<User> {
        self.read().map(|s| s.user)
    }

    fn set_session(&self, token: &str, user: &User) -> Result<(), SessionError> {
        *self.write() = Some(StoredSession {
            token: token.to_string(),
            user: user.clone(),
        });
        Ok(())
    }

    fn clear_session(&self) {
        *self.write() = None;
    }
}

/// Session persisted as a JSON file between CLI invocations
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort read: a missing or corrupt file is simply "no session"
    fn load(&self) -> Option<StoredSession> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    fn token(&self) -> Option<String> {
        self.load().map(|s| s.token).filter(|t| !t.is_empty())
    }

    fn user(&self) -> Option<User> {
        self.load().map(|s| s.user)
    }

    fn set_session(&self, token: &str, user: &User) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let session = StoredSession {
            token: token.to_string(),
            user: user.clone(),
        };
        fs::write(&self.path, serde_json::to_vec_pretty(&session)?)?;
        Ok(())
    }

    fn clear_session(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove session file"),
        }
    }
}
