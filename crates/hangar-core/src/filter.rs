//! In-memory list filtering shared by the private drone list and the
//! community views.
//!
//! A query is trimmed and case-folded. A leading `#` narrows matching to the
//! item id: `#12` matches any id whose digits contain `12` and never matches
//! on other text. Results keep their original relative order.

use crate::models::{Controller, Drone, VideoSystem};

/// Something a [`Query`] can match against.
pub trait Searchable {
    /// Id used by `#` queries, as text. Empty when the item has no id.
    fn id_text(&self) -> String;

    /// Every searchable field, joined. Case is folded by the matcher.
    fn search_text(&self) -> String;
}

/// Joins the present fields of a search surface with spaces.
pub(crate) fn join_fields<'a>(fields: impl IntoIterator<Item = Option<&'a str>>) -> String {
    fields
        .into_iter()
        .flatten()
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A normalized search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Empty query: everything matches.
    All,
    /// `#<fragment>`: matches ids containing the fragment.
    Id(String),
    /// Free text: matches the full search surface.
    Text(String),
}

impl Query {
    pub fn parse(raw: &str) -> Self {
        let folded = raw.trim().to_lowercase();
        if let Some(fragment) = folded.strip_prefix('#') {
            let fragment = fragment.trim();
            if fragment.is_empty() {
                return Query::All;
            }
            return Query::Id(fragment.to_string());
        }
        if folded.is_empty() {
            Query::All
        } else {
            Query::Text(folded)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Query::All)
    }

    pub fn matches<T: Searchable + ?Sized>(&self, item: &T) -> bool {
        match self {
            Query::All => true,
            Query::Id(fragment) => item.id_text().to_lowercase().contains(fragment.as_str()),
            Query::Text(text) => item.search_text().to_lowercase().contains(text.as_str()),
        }
    }
}

/// Returns the items matching `query`, in their original order.
pub fn filter<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let query = Query::parse(query);
    items.iter().filter(|item| query.matches(*item)).collect()
}

impl Searchable for Drone {
    fn id_text(&self) -> String {
        self.id.to_string()
    }

    fn search_text(&self) -> String {
        let id = self.id.to_string();
        join_fields([
            Some(id.as_str()),
            self.name.as_deref(),
            self.comment.as_deref(),
            self.controller.map(Controller::as_str),
            self.video.map(VideoSystem::as_str),
            self.radio.as_deref(),
            self.components.as_deref(),
        ])
    }
}
