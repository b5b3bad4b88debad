//! Language preference, stored next to the session but independent of it.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;

use super::storage::Storage;

/// Storage key for the language preference.
pub const LANG_KEY: &str = "lang";

/// Language for user-facing status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }

    /// Reads the stored preference; anything unrecognized is the default.
    pub fn load(storage: &dyn Storage) -> Self {
        storage
            .get(LANG_KEY)
            .and_then(|code| code.parse().ok())
            .unwrap_or_default()
    }

    /// Persists this language as the preference.
    ///
    /// # Errors
    /// Returns an error if storage could not be written.
    pub fn save(self, storage: &dyn Storage) -> Result<()> {
        storage.set(LANG_KEY, self.code())
    }

    /// Picks the text for this language.
    pub fn pick<'a>(self, es: &'a str, en: &'a str) -> &'a str {
        match self {
            Language::Es => es,
            Language::En => en,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "es" => Ok(Language::Es),
            "en" => Ok(Language::En),
            other => Err(format!("Unsupported language: {other} (expected es or en)")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
