//! Auth session: current user plus the persisted bearer token.
//!
//! A [`Session`] is created once by whoever owns the view tree and handed to
//! everything that needs it. State only changes through the lifecycle hooks
//! `init`, `login`, `logout` and `expire`.

use crate::domain::User;
use crate::error::ApiError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// On-disk shape of the persisted session. Key names are fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Where the session is persisted.
#[derive(Debug, Clone)]
pub enum TokenStorage {
    File(PathBuf),
    Memory(Arc<RwLock<StoredSession>>),
}

impl TokenStorage {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn memory() -> Self {
        Self::Memory(Arc::new(RwLock::new(StoredSession::default())))
    }

    pub fn load(&self) -> Result<StoredSession, ApiError> {
        match self {
            Self::File(path) => {
                if !path.exists() {
                    return Ok(StoredSession::default());
                }
                let raw = fs::read_to_string(path)?;
                Ok(serde_json::from_str(&raw)?)
            }
            Self::Memory(stored) => Ok(stored.read().clone()),
        }
    }

    pub fn save(&self, session: &StoredSession) -> Result<(), ApiError> {
        match self {
            Self::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        fs::create_dir_all(parent)?;
                    }
                }
                write_private(path, serde_json::to_string_pretty(session)?.as_bytes())?;
                Ok(())
            }
            Self::Memory(stored) => {
                *stored.write() = session.clone();
                Ok(())
            }
        }
    }

    pub fn clear(&self) -> Result<(), ApiError> {
        match self {
            Self::File(path) => {
                if path.exists() {
                    fs::remove_file(path)?;
                }
                Ok(())
            }
            Self::Memory(stored) => {
                *stored.write() = StoredSession::default();
                Ok(())
            }
        }
    }
}

/// The file holds bearer tokens, so only its owner may read it.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // The open mode only applies to new files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

/// Shared, cheaply cloneable handle to the signed-in state.
#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
    storage: TokenStorage,
}

impl Session {
    pub fn new(storage: TokenStorage) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            storage,
        }
    }

    /// Loads the persisted token. Returns whether a session was restored.
    ///
    /// A missing token clears whatever else is stored, and an unreadable file
    /// is treated as no session at all.
    pub fn init(&self) -> bool {
        let stored = match self.storage.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!("discarding unreadable session storage: {e}");
                StoredSession::default()
            }
        };

        match stored.auth_token {
            Some(token) if !token.is_empty() => {
                debug!("restored session for {:?}", stored.user.as_ref().map(|u| &u.email));
                let mut state = self.state.write();
                state.token = Some(token);
                state.user = stored.user;
                true
            }
            _ => {
                self.reset();
                false
            }
        }
    }

    pub fn login(
        &self,
        token: String,
        refresh_token: Option<String>,
        user: User,
    ) -> Result<(), ApiError> {
        self.storage.save(&StoredSession {
            auth_token: Some(token.clone()),
            refresh_token,
            user: Some(user.clone()),
        })?;

        info!("signed in as {}", user.email);
        let mut state = self.state.write();
        state.token = Some(token);
        state.user = Some(user);
        Ok(())
    }

    pub fn logout(&self) {
        info!("signed out");
        self.reset();
    }

    /// Called when the backend rejects the token.
    pub fn expire(&self) {
        if self.is_authenticated() {
            warn!("session rejected by backend, clearing stored token");
        }
        self.reset();
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().token.is_some()
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn is_staff(&self) -> bool {
        self.state.read().user.as_ref().is_some_and(|user| user.is_staff)
    }

    fn reset(&self) {
        {
            let mut state = self.state.write();
            state.token = None;
            state.user = None;
        }
        if let Err(e) = self.storage.clear() {
            warn!("failed to clear session storage: {e}");
        }
    }
}
