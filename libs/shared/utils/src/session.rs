use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use tracing::{debug, warn};

use shared_models::auth::{Role, Session, User};
use shared_models::error::AppError;

use crate::jwt;

/// Where pages read "who is signed in" from.
///
/// Pages only ever see this trait; the concrete store (memory, file) is injected.
pub trait SessionProvider: Send + Sync {
    fn role(&self) -> Option<Role>;
    fn user(&self) -> Option<User>;
    fn token(&self) -> Option<String>;
    fn store(&self, session: Session) -> Result<(), AppError>;
    fn clear(&self);

    fn is_signed_in(&self) -> bool {
        self.user().is_some()
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }

    fn current(&self) -> Option<Session> {
        self.session.read().ok().and_then(|guard| guard.clone())
    }
}

impl SessionProvider for MemorySessionStore {
    fn role(&self) -> Option<Role> {
        self.current().map(|s| s.role)
    }

    fn user(&self) -> Option<User> {
        self.current().map(|s| s.user)
    }

    fn token(&self) -> Option<String> {
        self.current().and_then(|s| s.token)
    }

    fn store(&self, session: Session) -> Result<(), AppError> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| AppError::Config("Session store lock poisoned".to_string()))?;
        *guard = Some(session);
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.session.write() {
            *guard = None;
        }
    }
}

/// Session persisted as JSON on disk so it survives between CLI invocations.
pub struct FileSessionStore {
    path: PathBuf,
    cached: RwLock<Option<Session>>,
}

impl FileSessionStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = match Self::read_file(&path) {
            Ok(session) => session,
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                None
            }
        };

        Self {
            path,
            cached: RwLock::new(cached),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(path: &Path) -> Result<Option<Session>, AppError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Cannot read session file: {}", e)))?;
        let session: Session = serde_json::from_str(&raw)?;
        Ok(Some(session))
    }

    fn current(&self) -> Option<Session> {
        let session = self.cached.read().ok().and_then(|guard| guard.clone())?;

        // An expired bearer token is as good as no session at all.
        if let Some(token) = session.token.as_deref() {
            if jwt::is_expired(token, Utc::now().timestamp() as u64) {
                debug!("Stored session token has expired");
                return None;
            }
        }
        Some(session)
    }
}

impl SessionProvider for FileSessionStore {
    fn role(&self) -> Option<Role> {
        self.current().map(|s| s.role)
    }

    fn user(&self) -> Option<User> {
        self.current().map(|s| s.user)
    }

    fn token(&self) -> Option<String> {
        self.current().and_then(|s| s.token)
    }

    fn store(&self, session: Session) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("Cannot create session directory: {}", e)))?;
        }
        let raw = serde_json::to_string_pretty(&session)?;
        fs::write(&self.path, raw)
            .map_err(|e| AppError::Config(format!("Cannot write session file: {}", e)))?;

        let mut guard = self
            .cached
            .write()
            .map_err(|_| AppError::Config("Session store lock poisoned".to_string()))?;
        *guard = Some(session);
        debug!("Session stored at {}", self.path.display());
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.cached.write() {
            *guard = None;
        }
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("Failed to remove session file {}: {}", self.path.display(), e);
            }
        }
    }
}
