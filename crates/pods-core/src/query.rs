//! Filter and sort pipeline for show and episode listings.
//!
//! Everything here is pure: inputs are borrowed, outputs are fresh vectors,
//! and running a query over its own output gives the same output.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::catalog::ShowSummary;
use crate::favorites::FavoriteEpisode;

/// Anything a listing can be filtered and sorted on.
pub trait Listing {
    /// Id used by the favorites-only restriction.
    fn id(&self) -> &str;

    fn title(&self) -> &str;

    /// Genre ids, if the record carries any.
    fn genre_ids(&self) -> Option<&BTreeSet<u32>> {
        None
    }

    fn timestamp(&self) -> Option<DateTime<Utc>>;

    /// Case-insensitive substring match against the searchable text.
    /// `needle` is already lowercased.
    fn matches_text(&self, needle: &str) -> bool {
        self.title().to_lowercase().contains(needle)
    }
}

impl Listing for ShowSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn genre_ids(&self) -> Option<&BTreeSet<u32>> {
        Some(&self.genre_ids)
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Listing for FavoriteEpisode {
    fn id(&self) -> &str {
        &self.show_id
    }

    /// Favorites list under their show's title.
    fn title(&self) -> &str {
        &self.show_title
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.updated.or(Some(self.saved_at))
    }

    fn matches_text(&self, needle: &str) -> bool {
        self.show_title.to_lowercase().contains(needle)
            || self.episode_title.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Sort order for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Keep input order.
    #[default]
    Unsorted,
    TitleAsc,
    TitleDesc,
    Oldest,
    Newest,
}

impl SortOrder {
    pub fn key(self) -> Option<SortKey> {
        match self {
            Self::Unsorted => None,
            Self::TitleAsc | Self::TitleDesc => Some(SortKey::Title),
            Self::Oldest | Self::Newest => Some(SortKey::Date),
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Self::TitleDesc | Self::Newest => Direction::Descending,
            _ => Direction::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unsorted => "none",
            Self::TitleAsc => "a-z",
            Self::TitleDesc => "z-a",
            Self::Oldest => "oldest",
            Self::Newest => "newest",
        }
    }

    /// Parse a label. Unknown labels mean "leave the order alone".
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "a-z" | "title" | "asc" => Self::TitleAsc,
            "z-a" | "desc" => Self::TitleDesc,
            "oldest" => Self::Oldest,
            "newest" | "date" => Self::Newest,
            _ => Self::Unsorted,
        }
    }
}

/// Title ordering close to a locale collation. Base letters compare first,
/// ignoring case and accents, so "Été" sorts with "e". Ties break on accents
/// (unaccented first), then case (lowercase first): "apple" < "Apple" < "banana".
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| {
            a.nfd()
                .flat_map(char::to_lowercase)
                .cmp(b.nfd().flat_map(char::to_lowercase))
        })
        .then_with(|| a.nfd().map(char::is_uppercase).cmp(b.nfd().map(char::is_uppercase)))
}

fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// Keep items in `category` (if any) whose text contains `query` (if any).
pub fn filter<T: Listing + Clone>(items: &[T], query: &str, category: Option<u32>) -> Vec<T> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| match category {
            Some(genre) => item.genre_ids().is_some_and(|ids| ids.contains(&genre)),
            None => true,
        })
        .filter(|item| needle.is_empty() || item.matches_text(&needle))
        .cloned()
        .collect()
}

/// Stable sort. Missing timestamps count as the Unix epoch.
pub fn sort<T: Listing + Clone>(items: &[T], order: SortOrder) -> Vec<T> {
    let mut out = items.to_vec();
    let Some(key) = order.key() else {
        return out;
    };
    let cmp = |a: &T, b: &T| match key {
        SortKey::Title => compare_titles(a.title(), b.title()),
        SortKey::Date => timestamp_or_epoch(a).cmp(&timestamp_or_epoch(b)),
    };
    match order.direction() {
        Direction::Ascending => out.sort_by(cmp),
        Direction::Descending => out.sort_by(|a, b| cmp(b, a)),
    }
    out
}

fn timestamp_or_epoch<T: Listing>(item: &T) -> DateTime<Utc> {
    item.timestamp().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// A listing request: text, genre, favorites restriction and order.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub text: String,
    pub genre: Option<u32>,
    /// When set, only items whose id is in the set survive.
    pub only_ids: Option<HashSet<String>>,
    pub sort: SortOrder,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn genre(mut self, genre: Option<u32>) -> Self {
        self.genre = genre;
        self
    }

    pub fn only_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Filter, then sort.
    pub fn apply<T: Listing + Clone>(&self, items: &[T]) -> Vec<T> {
        let mut filtered = filter(items, &self.text, self.genre);
        if let Some(ids) = &self.only_ids {
            filtered.retain(|item| ids.contains(item.id()));
        }
        sort(&filtered, self.sort)
    }
}
