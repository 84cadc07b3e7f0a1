//! Mailbox session and its durable storage
//!
//! A session is the `{address, token}` pair of the one active mailbox.
//! It is persisted wholesale on every generate and read back on start.
//! The stored keys (`email`, `authToken`) are fixed.

use crate::credential::Credential;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// The active mailbox's address and upstream token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxSession {
    #[serde(rename = "email")]
    pub address: String,
    #[serde(rename = "authToken")]
    pub token: String,
}

impl MailboxSession {
    #[must_use]
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
        }
    }

    /// Whether both halves of the pair are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.address.is_empty() && !self.token.is_empty()
    }

    #[must_use]
    pub fn credential(&self) -> Credential {
        Credential::new(self.token.clone())
    }
}

/// Durable storage for at most one session.
pub trait SessionStore {
    /// The stored session, if a complete one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read or decoded.
    fn load(&self) -> Result<Option<MailboxSession>>;

    /// Replace whatever is stored with `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn save(&self, session: &MailboxSession) -> Result<()>;

    /// Forget the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be cleared.
    fn clear(&self) -> Result<()>;
}

/// Session kept as a small JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<MailboxSession>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session: MailboxSession = serde_json::from_str(&raw)?;
        Ok(session.is_complete().then_some(session))
    }

    fn save(&self, session: &MailboxSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write then rename so a crash never leaves half a session behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(session)?)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Session kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<MailboxSession>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `session`.
    #[must_use]
    pub fn with_session(session: MailboxSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<MailboxSession>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.clone().filter(MailboxSession::is_complete))
    }

    fn save(&self, session: &MailboxSession) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
