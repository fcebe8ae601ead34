//! Session store.
//!
//! The session is nothing more than the bearer token returned by the
//! backend's login/register endpoints. It lives in durable storage under the
//! well-known key [`TOKEN_KEY`] so that it survives restarts, and is mirrored
//! in memory for the lifetime of the process.
//!
//! The token is never validated proactively: a stale token is only
//! discovered when a protected request is rejected, at which point the API
//! client calls [`Session::logout`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

/// Key under which the token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Errors that can occur while reading or writing the persisted session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the session file failed.
    #[error("session storage error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The session file exists but is not a JSON object.
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable storage for the session token.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    fn load(&self) -> Result<Option<SecretString>, SessionError>;

    /// Persist a token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn save(&self, token: &SecretString) -> Result<(), SessionError>;

    /// Remove the persisted token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn clear(&self) -> Result<(), SessionError>;
}

// =============================================================================
// FileTokenStore
// =============================================================================

/// Token store backed by a small JSON object on disk.
///
/// Only the [`TOKEN_KEY`] entry is touched; other keys in the file are
/// preserved. On Unix the file is created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store for the given file. Nothing is read or created yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_map(&self) -> Result<Map<String, Value>, SessionError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&contents).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Like `read_map`, but a corrupt file holds no usable token and is
    /// treated as empty so it gets replaced.
    fn read_map_or_replace(&self) -> Result<Map<String, Value>, SessionError> {
        match self.read_map() {
            Err(SessionError::Corrupt { .. }) => Ok(Map::new()),
            other => other,
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let body = serde_json::to_vec_pretty(map).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        // Write to a sibling file and rename so a crash never leaves half a token.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| self.io_error(e))?;
        restrict_permissions(&tmp).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SecretString>, SessionError> {
        let map = self.read_map()?;
        Ok(map
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::from(t.to_owned())))
    }

    fn save(&self, token: &SecretString) -> Result<(), SessionError> {
        let mut map = self.read_map_or_replace()?;
        map.insert(
            TOKEN_KEY.to_owned(),
            Value::String(token.expose_secret().to_owned()),
        );
        self.write_map(&map)
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut map = self.read_map_or_replace()?;

        if map.remove(TOKEN_KEY).is_none() && !self.path.exists() {
            return Ok(());
        }

        if map.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(self.io_error(e)),
            };
        }

        self.write_map(&map)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

// =============================================================================
// MemoryTokenStore
// =============================================================================

/// Token store that lives only as long as the process. Used by tests and by
/// callers that do not want anything written to disk.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<SecretString>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a token.
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(SecretString::from(token.to_owned()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, SessionError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &SecretString) -> Result<(), SessionError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// =============================================================================
// Session
// =============================================================================

/// The current session, shared by every view.
///
/// Cheaply cloneable; all clones observe the same token.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
    token: Arc<RwLock<Option<SecretString>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open the session persisted in `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn open(store: Arc<dyn TokenStore>) -> Result<Self, SessionError> {
        let token = store.load()?;
        debug!(authenticated = token.is_some(), "Session opened");
        Ok(Self {
            store,
            token: Arc::new(RwLock::new(token)),
        })
    }

    /// Persist a freshly issued token and make it current.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted; the in-memory
    /// session is left unchanged in that case.
    pub fn login(&self, token: SecretString) -> Result<(), SessionError> {
        self.store.save(&token)?;
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        info!("Session started");
        Ok(())
    }

    /// Forget the token, both in memory and in durable storage.
    ///
    /// The in-memory token is cleared even if storage fails, so a rejected
    /// token is never sent twice.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted token cannot be removed.
    pub fn logout(&self) -> Result<(), SessionError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("Session ended");
        self.store.clear()
    }

    /// The current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a token is currently held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
