//! Community views: public drones and public dumps from one feed.

use std::future::Future;
use std::sync::{Arc, Mutex};

use super::{MountHandle, MountScope, banner_for, lock};
use crate::api::ApiClient;
use crate::feed::CommunityFeed;
use crate::session::{Language, SessionEnded, SessionWatch};

#[derive(Debug, Default)]
struct CommunityState {
    feed: Arc<CommunityFeed>,
    loading: bool,
    banner: Option<String>,
    /// Bumped on every session end; results fetched under an older value
    /// are dropped.
    generation: u64,
}

/// State behind the community drones and dumps pages.
#[derive(Debug)]
pub struct CommunityView {
    api: ApiClient,
    lang: Language,
    state: Arc<Mutex<CommunityState>>,
    watch: SessionWatch,
    scope: MountScope,
}

impl CommunityView {
    /// Mounts a view; it watches the session for as long as it lives.
    pub fn mount(api: ApiClient, lang: Language) -> Self {
        let watch = api.events().subscribe();
        Self {
            api,
            lang,
            state: Arc::new(Mutex::new(CommunityState::default())),
            watch,
            scope: MountScope::new(),
        }
    }

    pub fn handle(&self) -> MountHandle {
        self.scope.handle()
    }

    /// Fetches the feed and replaces the current one.
    ///
    /// On failure the feed becomes empty and a banner is set (none for an
    /// unauthorized response). The returned future owns everything it needs;
    /// it resolves to whether the result was applied, which is false once the
    /// view has been unmounted or the session ended while it was in flight.
    pub fn refresh(&self) -> impl Future<Output = bool> + Send + 'static {
        let api = self.api.clone();
        let lang = self.lang;
        let state = Arc::clone(&self.state);
        let handle = self.scope.handle();

        let mut generation = 0;
        handle.apply(|| {
            let mut state = lock(&state);
            state.loading = true;
            state.banner = None;
            generation = state.generation;
        });

        async move {
            let result = api.community_feed().await;

            let mut applied = false;
            handle.apply(|| {
                let mut state = lock(&state);
                if state.generation != generation {
                    tracing::debug!("session ended during refresh; discarding result");
                    return;
                }
                applied = true;
                state.loading = false;
                match result {
                    Ok(entries) => {
                        state.feed = Arc::new(CommunityFeed::from_entries(entries));
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "community feed failed");
                        state.feed = Arc::new(CommunityFeed::empty());
                        state.banner = banner_for(&e, lang);
                    }
                }
            });
            applied
        }
    }

    /// The current feed snapshot.
    pub fn feed(&self) -> Arc<CommunityFeed> {
        Arc::clone(&lock(&self.state).feed)
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }

    pub fn banner(&self) -> Option<String> {
        lock(&self.state).banner.clone()
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    /// Checks for a session-ended signal. On one, the view drops its state
    /// and the caller should send the user to sign in.
    pub fn session_ended(&mut self) -> Option<SessionEnded> {
        let event = self.watch.try_next()?;
        let mut state = lock(&self.state);
        *state = CommunityState {
            generation: state.generation + 1,
            ..CommunityState::default()
        };
        Some(event)
    }
}
