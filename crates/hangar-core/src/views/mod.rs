//! View state with an explicit mount lifecycle.
//!
//! A view owns a [`MountScope`] for as long as it is mounted. Loads run as
//! detached futures holding a [`MountHandle`]; a result that arrives after
//! the view was torn down is discarded instead of applied. Requests are never
//! aborted; only their results are dropped.

mod community;
mod manage;

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

pub use community::CommunityView;
pub use manage::{ManageView, confirmation_phrase};

use crate::api::ApiError;
use crate::session::Language;

/// Lifetime of one mounted view. Unmounts on drop.
#[derive(Debug, Default)]
pub struct MountScope {
    token: CancellationToken,
}

impl MountScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle for effects started by this view.
    pub fn handle(&self) -> MountHandle {
        MountHandle {
            token: self.token.clone(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn unmount(&self) {
        self.token.cancel();
    }
}

impl Drop for MountScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Effect-side view of a [`MountScope`].
#[derive(Debug, Clone)]
pub struct MountHandle {
    token: CancellationToken,
}

impl MountHandle {
    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Runs `update` only while the view is still mounted.
    ///
    /// Returns whether the update was applied.
    pub fn apply(&self, update: impl FnOnce()) -> bool {
        if !self.is_mounted() {
            tracing::debug!("view unmounted; discarding result");
            return false;
        }
        update();
        true
    }

    /// Resolves once the view is unmounted.
    pub async fn unmounted(&self) {
        self.token.cancelled().await;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Banner for a failed call; `None` for failures the session signal covers.
fn banner_for(err: &ApiError, lang: Language) -> Option<String> {
    if err.is_unauthorized() {
        tracing::debug!("unauthorized; session signal handles it");
    }
    err.user_message(lang)
}
