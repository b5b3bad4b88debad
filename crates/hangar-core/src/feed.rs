//! Community feed aggregation.
//!
//! The backend returns a nested feed (post, drone, owner, dumps). A
//! [`CommunityFeed`] is built from one fetch and derives two read-only
//! projections from it without further I/O:
//!
//! - by post: the entries in server order, searchable over post, drone and owner
//! - by dump: every dump flattened out of every entry, newest first
//!
//! A feed is always replaced wholesale; it is never merged with an older one.

use std::collections::HashSet;

use crate::filter::{Query, Searchable, join_fields};
use crate::models::{Controller, Dump, FeedEntry, Owner, VideoSystem};
use crate::session::Language;

/// One dump in the flattened projection, tagged with its parent post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpRow {
    pub dump: Dump,
    pub post_id: Option<i64>,
    pub post_title: Option<String>,
    pub drone_id: Option<i64>,
    pub drone_name: Option<String>,
    pub owner_handle: Option<String>,
}

impl DumpRow {
    fn new(entry: &FeedEntry, dump: &Dump) -> Self {
        Self {
            dump: dump.clone(),
            post_id: entry.post.id,
            post_title: entry.post.title.clone(),
            drone_id: entry.drone.id,
            drone_name: entry.drone.name.clone(),
            owner_handle: entry.owner.handle.clone(),
        }
    }

    pub fn display_owner(&self) -> &str {
        self.owner_handle.as_deref().unwrap_or(Owner::FALLBACK_HANDLE)
    }

    pub fn display_drone(&self) -> String {
        match (&self.drone_name, self.drone_id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("Drone #{id}"),
            (None, None) => "Drone".to_string(),
        }
    }
}

impl Searchable for FeedEntry {
    fn id_text(&self) -> String {
        self.drone.id.map_or_else(String::new, |id| id.to_string())
    }

    fn search_text(&self) -> String {
        let drone_id = self.drone.id.map(|id| id.to_string());
        join_fields([
            self.post.title.as_deref(),
            self.post.public_note.as_deref(),
            drone_id.as_deref(),
            self.drone.name.as_deref(),
            self.drone.comment.as_deref(),
            self.drone.controller.map(Controller::as_str),
            self.drone.video.map(VideoSystem::as_str),
            self.drone.radio.as_deref(),
            self.drone.components.as_deref(),
            self.owner.handle.as_deref(),
        ])
    }
}

impl Searchable for DumpRow {
    fn id_text(&self) -> String {
        self.dump.id.map_or_else(String::new, |id| id.to_string())
    }

    fn search_text(&self) -> String {
        let id = self.dump.id.map(|id| id.to_string());
        let bytes = self.dump.bytes.map(|b| b.to_string());
        let drone_id = self.drone_id.map(|id| id.to_string());
        join_fields([
            id.as_deref(),
            self.dump.original_name.as_deref(),
            bytes.as_deref(),
            self.owner_handle.as_deref(),
            drone_id.as_deref(),
            self.drone_name.as_deref(),
            self.post_title.as_deref(),
        ])
    }
}

/// The result of applying a query to one projection.
#[derive(Debug, PartialEq, Eq)]
pub enum Listing<'a, T> {
    /// At least one item matched.
    Items(Vec<&'a T>),
    /// The feed itself is empty and no query was given.
    NoEntries,
    /// The query matched nothing.
    NoResults,
}

impl<'a, T: Searchable> Listing<'a, T> {
    /// Filters `items` and classifies an empty outcome.
    pub fn of(items: &'a [T], raw_query: &str) -> Self {
        let query = Query::parse(raw_query);
        let matched: Vec<&T> = items.iter().filter(|item| query.matches(*item)).collect();

        if !matched.is_empty() {
            Listing::Items(matched)
        } else if query.is_empty() {
            Listing::NoEntries
        } else {
            Listing::NoResults
        }
    }
}

impl<T> Listing<'_, T> {
    pub fn items(&self) -> &[&T] {
        match self {
            Listing::Items(items) => items,
            Listing::NoEntries | Listing::NoResults => &[],
        }
    }

    /// Notice shown instead of an empty list.
    pub fn notice(&self, lang: Language) -> Option<&'static str> {
        match self {
            Listing::Items(_) => None,
            Listing::NoEntries => Some(lang.pick(
                "Todavía no hay publicaciones públicas.",
                "No public entries yet.",
            )),
            Listing::NoResults => Some(lang.pick(
                "No hay resultados para esa búsqueda.",
                "No search results.",
            )),
        }
    }
}

/// A fetched feed and its derived projections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunityFeed {
    entries: Vec<FeedEntry>,
    dumps: Vec<DumpRow>,
}

impl CommunityFeed {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds both projections from one fetch.
    ///
    /// A dump is identified by (post id, dump id); a repeat of the same pair
    /// is dropped, first occurrence wins. Dumps without an id are kept.
    pub fn from_entries(entries: Vec<FeedEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut dumps: Vec<DumpRow> = entries
            .iter()
            .flat_map(|entry| entry.dumps.iter().map(move |dump| (entry, dump)))
            .filter(|(entry, dump)| match dump.id {
                Some(id) => seen.insert((entry.post.id, id)),
                None => true,
            })
            .map(|(entry, dump)| DumpRow::new(entry, dump))
            .collect();

        // Stable sort: rows equal on both keys keep feed order.
        dumps.sort_by(|a, b| Dump::newest_first(&a.dump, &b.dump));

        tracing::debug!(
            entries = entries.len(),
            dumps = dumps.len(),
            "community feed aggregated"
        );

        Self { entries, dumps }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in server order.
    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    /// Flattened dumps, newest first.
    pub fn dumps(&self) -> &[DumpRow] {
        &self.dumps
    }

    /// The by-post projection narrowed by `query`.
    pub fn posts(&self, query: &str) -> Listing<'_, FeedEntry> {
        Listing::of(&self.entries, query)
    }

    /// The by-dump projection narrowed by `query`.
    pub fn dump_rows(&self, query: &str) -> Listing<'_, DumpRow> {
        Listing::of(&self.dumps, query)
    }
}
