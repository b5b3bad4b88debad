//! Route table and the signed-in gate in front of it.
//!
//! The check is synchronous and reads the session store on every call, so a
//! decision never outlives a logout.

use std::fmt;

use crate::session::SessionStore;

/// Where a navigation lands when no safe destination was remembered.
pub const DEFAULT_AFTER_SIGN_IN: Route = Route::Manage;

/// Every destination the client knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    HomeLogged,
    Manage,
    Drone(i64),
    DumpParse { drone: i64, dump: i64 },
    CommunityDrones,
    CommunityDumps,
}

/// Drops any `?query` or `#fragment` and a trailing slash.
fn base_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let base = &path[..end];
    if base.len() > 1 {
        base.trim_end_matches('/')
    } else {
        base
    }
}

impl Route {
    /// Parses a known path; `None` for anything unrecognized.
    pub fn parse(path: &str) -> Option<Self> {
        let base = base_path(path.trim());
        let segments: Vec<&str> = base.trim_start_matches('/').split('/').collect();

        let route = match segments.as_slice() {
            [""] => Route::Home,
            ["login"] => Route::Login,
            ["homelogged"] => Route::HomeLogged,
            ["manage"] => Route::Manage,
            ["drones", id] => Route::Drone(id.parse().ok()?),
            ["drones", drone, "dumps", dump, "parse"] => Route::DumpParse {
                drone: drone.parse().ok()?,
                dump: dump.parse().ok()?,
            },
            ["community", "drones"] => Route::CommunityDrones,
            ["community", "dumps"] => Route::CommunityDumps,
            _ => return None,
        };
        Some(route)
    }

    /// Parses a path, sending unknown paths home.
    pub fn resolve(path: &str) -> Self {
        Self::parse(path).unwrap_or(Route::Home)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::HomeLogged => "/homelogged".to_string(),
            Route::Manage => "/manage".to_string(),
            Route::Drone(id) => format!("/drones/{id}"),
            Route::DumpParse { drone, dump } => format!("/drones/{drone}/dumps/{dump}/parse"),
            Route::CommunityDrones => "/community/drones".to_string(),
            Route::CommunityDumps => "/community/dumps".to_string(),
        }
    }

    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            Route::HomeLogged | Route::Manage | Route::Drone(_) | Route::DumpParse { .. }
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Render the route.
    Render(Route),
    /// Send the user to sign in; `from` is where they were headed.
    Redirect { to: Route, from: String },
}

/// Gate for routes that require a session.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: SessionStore,
}

impl RouteGuard {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    /// Decides whether `path` may render right now.
    ///
    /// A denied path is remembered so sign-in can return to it.
    pub fn check(&self, path: &str) -> Access {
        let route = Route::resolve(path);
        if !route.requires_session() || self.session.is_authenticated() {
            return Access::Render(route);
        }

        let from = route.path();
        if let Err(e) = self.session.remember_destination(&from) {
            tracing::warn!(error = %e, "failed to remember destination");
        }
        tracing::debug!(from = %from, "redirecting to sign-in");

        Access::Redirect {
            to: Route::Login,
            from,
        }
    }

    /// Consumes the remembered destination and returns where to go after a
    /// successful sign-in.
    pub fn after_sign_in(&self) -> String {
        let remembered = match self.session.take_destination() {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read destination");
                None
            }
        };
        safe_redirect_target(remembered.as_deref())
    }
}

/// Accepts only internal, known destinations; anything else is `/manage`.
pub fn safe_redirect_target(candidate: Option<&str>) -> String {
    let fallback = DEFAULT_AFTER_SIGN_IN.path();
    let Some(raw) = candidate else {
        return fallback;
    };

    let trimmed = raw.trim();
    if !trimmed.starts_with('/')
        || trimmed.starts_with("//")
        || trimmed.starts_with("/\\")
        || trimmed.contains("://")
    {
        return fallback;
    }

    match Route::parse(trimmed) {
        Some(Route::Login) | None => fallback,
        Some(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_routes() {
        assert_eq!(Route::parse("/"), Some(Route::Home));
        assert_eq!(Route::parse("/manage/"), Some(Route::Manage));
        assert_eq!(Route::parse("/drones/42?tab=dumps"), Some(Route::Drone(42)));
        assert_eq!(
            Route::parse("/drones/4/dumps/9/parse"),
            Some(Route::DumpParse { drone: 4, dump: 9 })
        );
        assert_eq!(Route::parse("/community/dumps"), Some(Route::CommunityDumps));
    }

    #[test]
    fn unknown_routes_resolve_home() {
        assert_eq!(Route::parse("/drones/abc"), None);
        assert_eq!(Route::resolve("/nope"), Route::Home);
        assert_eq!(Route::resolve("/drones/1/extra"), Route::Home);
    }

    #[test]
    fn path_round_trips() {
        for route in [
            Route::Home,
            Route::Login,
            Route::HomeLogged,
            Route::Manage,
            Route::Drone(7),
            Route::DumpParse { drone: 1, dump: 2 },
            Route::CommunityDrones,
            Route::CommunityDumps,
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
    }

    #[test]
    fn protected_route_redirects_and_remembers() {
        let session = SessionStore::in_memory();
        let guard = RouteGuard::new(session.clone());

        assert_eq!(
            guard.check("/drones/7"),
            Access::Redirect {
                to: Route::Login,
                from: "/drones/7".to_string()
            }
        );
        assert_eq!(guard.after_sign_in(), "/drones/7");
        // Taken once.
        assert_eq!(guard.after_sign_in(), "/manage");
    }

    #[test]
    fn public_routes_render_without_session() {
        let guard = RouteGuard::new(SessionStore::in_memory());
        assert_eq!(
            guard.check("/community/drones"),
            Access::Render(Route::CommunityDrones)
        );
        assert_eq!(guard.check("/login"), Access::Render(Route::Login));
    }

    #[test]
    fn decision_follows_session_changes() {
        let session = SessionStore::in_memory();
        let guard = RouteGuard::new(session.clone());

        session.set_session("tok").unwrap();
        assert_eq!(guard.check("/manage"), Access::Render(Route::Manage));

        session.clear_session().unwrap();
        assert!(matches!(guard.check("/manage"), Access::Redirect { .. }));
    }

    #[test]
    fn redirect_target_rejects_external_and_unknown() {
        for bad in [
            None,
            Some("https://evil.example"),
            Some("//evil.example"),
            Some("/\\evil.example"),
            Some("manage"),
            Some("/login"),
            Some("/unknown"),
            Some("/x?next=http://evil"),
        ] {
            assert_eq!(safe_redirect_target(bad), "/manage", "{bad:?}");
        }
        assert_eq!(safe_redirect_target(Some(" /drones/3 ")), "/drones/3");
        assert_eq!(safe_redirect_target(Some("/")), "/");
    }
}
