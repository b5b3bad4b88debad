//! Session store: the credential held between runs.
//!
//! Pure data access over [`Storage`]; no network. A present token means the
//! client considers itself signed in until the backend says otherwise.

mod events;
mod prefs;
mod storage;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

pub use events::{EndReason, SessionEnded, SessionEvents, SessionWatch};
pub use prefs::{LANG_KEY, Language};
pub use storage::{FileStorage, MemoryStorage, Storage};

/// Storage key for the bearer credential.
pub const TOKEN_KEY: &str = "hangar_token";
/// Storage key for the one-shot notice shown at the next sign-in.
pub const SESSION_MSG_KEY: &str = "hangar_session_msg";
/// Storage key for the destination a guarded route was heading to.
pub const RETURN_TO_KEY: &str = "hangar_return_to";

const EXPIRED_NOTICE: &str = "Session expired. Please sign in again.";

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// A store that forgets everything when the process exits.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// The underlying storage, shared with preferences.
    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage)
    }

    /// Persists `token` as the current credential. An empty token clears.
    ///
    /// # Errors
    /// Returns an error if storage could not be written.
    pub fn set_session(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return self.clear_session();
        }
        self.storage.set(TOKEN_KEY, token)?;
        tracing::info!("session stored");
        Ok(())
    }

    /// Returns the current credential, if any.
    pub fn get_session(&self) -> Option<String> {
        self.storage
            .get(TOKEN_KEY)
            .filter(|token| !token.trim().is_empty())
    }

    /// Removes the credential.
    ///
    /// # Errors
    /// Returns an error if storage could not be written.
    pub fn clear_session(&self) -> Result<()> {
        self.storage.remove(TOKEN_KEY)?;
        tracing::info!("session cleared");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_session().is_some()
    }

    /// Ends the session if it still holds `token`, leaving the expiry notice
    /// for the next sign-in. Returns whether this call ended it.
    ///
    /// Concurrent rejections of the same credential race here; only one wins.
    ///
    /// # Errors
    /// Returns an error if storage could not be written.
    pub fn end_if_current(&self, token: &str) -> Result<bool> {
        let ended = self.storage.remove_if(TOKEN_KEY, token)?;
        if ended {
            self.storage.set(SESSION_MSG_KEY, EXPIRED_NOTICE)?;
            tracing::warn!("credential rejected by backend; session ended");
        }
        Ok(ended)
    }

    /// Reads and removes the notice left by an expired session.
    ///
    /// # Errors
    /// Returns an error if storage could not be written.
    pub fn take_notice(&self) -> Result<Option<String>> {
        let notice = self.storage.get(SESSION_MSG_KEY);
        if notice.is_some() {
            self.storage.remove(SESSION_MSG_KEY)?;
        }
        Ok(notice)
    }

    /// Remembers where a redirected navigation was heading.
    ///
    /// # Errors
    /// Returns an error if storage could not be written.
    pub fn remember_destination(&self, path: &str) -> Result<()> {
        self.storage.set(RETURN_TO_KEY, path)
    }

    /// Reads and removes the remembered destination.
    ///
    /// # Errors
    /// Returns an error if storage could not be written.
    pub fn take_destination(&self) -> Result<Option<String>> {
        let path = self.storage.get(RETURN_TO_KEY);
        if path.is_some() {
            self.storage.remove(RETURN_TO_KEY)?;
        }
        Ok(path)
    }
}
