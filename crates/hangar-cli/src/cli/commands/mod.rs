//! CLI command handlers.

pub mod auth;
pub mod community;
pub mod config;
pub mod drones;
pub mod lang;

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use hangar_core::api::{ApiClient, ApiError};
use hangar_core::config::Config;
use hangar_core::guard::{Access, Route, RouteGuard};
use hangar_core::models::Dump;
use hangar_core::session::{FileStorage, Language, SessionEnded, SessionEvents, SessionStore};

/// Everything a command needs: the client, the gate and the language.
pub struct Context {
    pub api: ApiClient,
    pub guard: RouteGuard,
    pub lang: Language,
}

impl Context {
    /// Opens the on-disk session and builds the client from `config`.
    pub fn open(config: &Config) -> Result<Self> {
        let storage = Arc::new(FileStorage::open_default()?);
        let lang = Language::load(storage.as_ref());
        let session = SessionStore::new(storage);
        let api = ApiClient::from_config(config, session.clone(), SessionEvents::new())?;

        Ok(Self {
            api,
            guard: RouteGuard::new(session),
            lang,
        })
    }

    /// Passes `route` through the guard before a command touches it.
    pub fn enter(&self, route: Route) -> Result<()> {
        match self.guard.check(&route.path()) {
            Access::Render(_) => Ok(()),
            Access::Redirect { from, .. } => bail!(
                "{} {from}. {}",
                self.lang.pick("Inicia sesión para abrir", "Sign in to open"),
                self.lang
                    .pick("Ejecuta `hangar login`.", "Run `hangar login`.")
            ),
        }
    }

    /// Turns a request failure into the message shown to the user.
    pub fn failure(&self, err: &ApiError) -> anyhow::Error {
        match err.user_message(self.lang) {
            Some(text) => anyhow!(text),
            None => self.session_lost(),
        }
    }

    fn session_lost(&self) -> anyhow::Error {
        anyhow!(self.lang.pick(
            "Sesión finalizada. Ejecuta `hangar login` para volver a entrar.",
            "Session ended. Run `hangar login` to sign in again.",
        ))
    }

    /// Settles a view after a load: a session-ended signal or a banner
    /// becomes the command error.
    pub fn settle_view(&self, ended: Option<SessionEnded>, banner: Option<String>) -> Result<()> {
        if ended.is_some() {
            return Err(self.session_lost());
        }
        match banner {
            Some(text) => Err(anyhow!(text)),
            None => Ok(()),
        }
    }
}

/// Human-readable byte size.
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

/// Upload time and size columns for a dump listing.
pub fn dump_columns(dump: &Dump) -> (String, String) {
    let when = dump.created_at.map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    );
    let size = dump.bytes.map_or_else(|| "-".to_string(), format_bytes);
    (when, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
