//! Private drone list: load, create, delete and filter.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{MountHandle, MountScope, banner_for, lock};
use crate::api::{ApiClient, ApiError, ApiResult};
use crate::filter::filter;
use crate::models::{Drone, DroneDraft};
use crate::session::{Language, SessionEnded, SessionWatch};

/// The phrase a user must type to delete drone `id`.
pub fn confirmation_phrase(lang: Language, id: i64) -> String {
    format!("{} #{id}", lang.pick("BORRAR", "DELETE"))
}

#[derive(Debug, Default)]
struct ManageState {
    drones: Vec<Drone>,
    loading: bool,
    banner: Option<String>,
    notice: Option<String>,
    /// Bumped on every session end; loads started before it are dropped.
    generation: u64,
}

/// Clears the busy flag when a mutating call finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State behind the drone management page.
#[derive(Debug)]
pub struct ManageView {
    api: ApiClient,
    lang: Language,
    state: Arc<Mutex<ManageState>>,
    busy: AtomicBool,
    watch: SessionWatch,
    scope: MountScope,
}

impl ManageView {
    pub fn mount(api: ApiClient, lang: Language) -> Self {
        let watch = api.events().subscribe();
        Self {
            api,
            lang,
            state: Arc::new(Mutex::new(ManageState::default())),
            busy: AtomicBool::new(false),
            watch,
            scope: MountScope::new(),
        }
    }

    pub fn handle(&self) -> MountHandle {
        self.scope.handle()
    }

    /// Fetches the list, newest first, replacing the current one.
    ///
    /// Resolves to whether the result was applied (false once unmounted or
    /// once the session ended while the load was in flight).
    pub fn load(&self) -> impl Future<Output = bool> + Send + 'static {
        let api = self.api.clone();
        let lang = self.lang;
        let state = Arc::clone(&self.state);
        let handle = self.scope.handle();

        let mut generation = 0;
        handle.apply(|| {
            let mut state = lock(&state);
            state.loading = true;
            state.banner = None;
            state.notice = None;
            generation = state.generation;
        });

        async move {
            let result = api.list_drones().await;

            let mut applied = false;
            handle.apply(|| {
                let mut state = lock(&state);
                if state.generation != generation {
                    tracing::debug!("session ended during load; discarding result");
                    return;
                }
                applied = true;
                state.loading = false;
                match result {
                    Ok(drones) => state.drones = drones,
                    // The previous list stays; only the banner changes.
                    Err(e) => state.banner = banner_for(&e, lang),
                }
            });
            applied
        }
    }

    fn begin_mutation(&self) -> ApiResult<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ApiError::validation(self.lang.pick(
                "Hay otra operación en curso.",
                "Another change is still in progress.",
            )));
        }
        lock(&self.state).banner = None;
        Ok(BusyGuard(&self.busy))
    }

    /// Records the outcome of a mutating call and hands it back.
    fn settle<T>(&self, result: ApiResult<T>, notice: &str) -> ApiResult<T> {
        let mut state = lock(&self.state);
        match &result {
            Ok(_) => state.notice = Some(notice.to_string()),
            Err(e) => state.banner = banner_for(e, self.lang),
        }
        result
    }

    /// Validates `draft` and creates the drone; it is shown first.
    ///
    /// # Errors
    /// Returns a validation error (no request made) or the request failure.
    pub async fn create(&self, draft: &DroneDraft) -> ApiResult<Drone> {
        let payload = match draft.validate() {
            Ok(payload) => payload,
            Err(e) => return self.settle(Err(e), ""),
        };
        let _busy = self.begin_mutation()?;

        let result = self.api.create_drone(&payload).await;
        if let Ok(drone) = &result {
            let drone = drone.clone();
            self.scope
                .handle()
                .apply(|| lock(&self.state).drones.insert(0, drone));
        }
        self.settle(
            result,
            self.lang
                .pick("Dron creado correctamente.", "Drone created successfully."),
        )
    }

    /// Deletes drone `id` once `typed` equals its confirmation phrase.
    ///
    /// # Errors
    /// Returns a validation error when the phrase does not match (no request
    /// made) or the request failure.
    pub async fn delete(&self, id: i64, typed: &str) -> ApiResult<()> {
        let expected = confirmation_phrase(self.lang, id);
        if typed.trim() != expected {
            let message = match self.lang {
                Language::Es => format!("Cancelado. Debes escribir exactamente: {expected}"),
                Language::En => format!("Cancelled. You must type exactly: {expected}"),
            };
            return self.settle(Err(ApiError::validation(message)), "");
        }
        let _busy = self.begin_mutation()?;

        let result = self.api.delete_drone(id).await;
        if result.is_ok() {
            self.scope
                .handle()
                .apply(|| lock(&self.state).drones.retain(|d| d.id != id));
        }
        self.settle(result, self.lang.pick("Dron eliminado.", "Drone deleted."))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }

    /// All drones, newest first.
    pub fn drones(&self) -> Vec<Drone> {
        lock(&self.state).drones.clone()
    }

    /// Drones matching `query`, in list order.
    pub fn filtered(&self, query: &str) -> Vec<Drone> {
        let state = lock(&self.state);
        filter(&state.drones, query).into_iter().cloned().collect()
    }

    pub fn banner(&self) -> Option<String> {
        lock(&self.state).banner.clone()
    }

    pub fn notice(&self) -> Option<String> {
        lock(&self.state).notice.clone()
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    /// Checks for a session-ended signal. On one, the view drops its state
    /// and the caller should send the user to sign in.
    pub fn session_ended(&mut self) -> Option<SessionEnded> {
        let event = self.watch.try_next()?;
        let mut state = lock(&self.state);
        *state = ManageState {
            generation: state.generation + 1,
            ..ManageState::default()
        };
        Some(event)
    }
}
