//! Records returned by the podcast catalog API.
//!
//! The catalog is read-only from our side: these types are deserialized from
//! responses, then filtered, sorted and copied, never mutated in place.
//! Fields the API sometimes leaves out are `Option` or default to empty so
//! callers handle the absent case explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Genre ids the catalog assigns, with their display titles.
pub const GENRE_TITLES: [(u32, &str); 9] = [
    (1, "Personal Growth"),
    (2, "Investigative Journalism"),
    (3, "History"),
    (4, "Comedy"),
    (5, "Entertainment"),
    (6, "Business"),
    (7, "Fiction"),
    (8, "News"),
    (9, "Kids and Family"),
];

pub fn genre_title(id: u32) -> Option<&'static str> {
    GENRE_TITLES
        .iter()
        .find(|(gid, _)| *gid == id)
        .map(|(_, title)| *title)
}

/// Case-insensitive lookup of a genre id by its title.
pub fn genre_id_by_title(title: &str) -> Option<u32> {
    let wanted = title.trim().to_lowercase();
    GENRE_TITLES
        .iter()
        .find(|(_, t)| t.to_lowercase() == wanted)
        .map(|(id, _)| *id)
}

/// Show preview as listed by `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "genres", default)]
    pub genre_ids: BTreeSet<u32>,
    /// Number of seasons; the preview carries a count, not the seasons.
    #[serde(rename = "seasons", default)]
    pub season_count: Option<u32>,
    #[serde(rename = "updated", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full show record from `GET /id/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDetail {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    /// Genre names (the detail endpoint sends titles, not ids).
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(rename = "updated", default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seasons: Vec<SeasonDetail>,
}

impl ShowDetail {
    /// Look up a season by its number (1-based, as the catalog numbers them).
    pub fn season(&self, number: u32) -> Option<&SeasonDetail> {
        self.seasons.iter().find(|s| s.season_number == number)
    }

    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDetail {
    #[serde(rename = "season", default)]
    pub season_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub episodes: Vec<EpisodeSummary>,
}

impl SeasonDetail {
    pub fn episode(&self, number: u32) -> Option<&EpisodeSummary> {
        self.episodes.iter().find(|e| e.episode_number == number)
    }

    /// Season title, or "Season N" when the catalog left it blank.
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            format!("Season {}", self.season_number)
        } else {
            self.title.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    #[serde(rename = "episode", default)]
    pub episode_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Empty when the catalog has no audio for the episode.
    #[serde(rename = "file", default)]
    pub audio_url: String,
}

/// Identity of an episode across the favorites and history stores.
///
/// Two records name the same episode iff all three fields match; every other
/// field (numbers, timestamps, titles of the show) is payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeKey {
    pub show_id: String,
    pub season_title: String,
    pub episode_title: String,
}

impl EpisodeKey {
    pub fn new(
        show_id: impl Into<String>,
        season_title: impl Into<String>,
        episode_title: impl Into<String>,
    ) -> Self {
        Self {
            show_id: show_id.into(),
            season_title: season_title.into(),
            episode_title: episode_title.into(),
        }
    }

    pub fn of(show_id: &str, season: &SeasonDetail, episode: &EpisodeSummary) -> Self {
        Self::new(show_id, season.display_title(), episode.title.clone())
    }
}

/// Genre record from `GET /genre/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreDetail {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub shows: Vec<GenreShow>,
}

/// The genre endpoint lists member shows either by id or as embedded previews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenreShow {
    Id(String),
    Preview(ShowSummary),
}

impl GenreShow {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Preview(show) => &show.id,
        }
    }
}

impl GenreDetail {
    pub fn show_ids(&self) -> impl Iterator<Item = &str> {
        self.shows.iter().map(GenreShow::id)
    }

    /// Resolve member shows to previews, preferring embedded records and
    /// falling back to `previews` for bare ids. Unknown ids are dropped.
    pub fn resolve_shows(&self, previews: &[ShowSummary]) -> Vec<ShowSummary> {
        self.shows
            .iter()
            .filter_map(|entry| match entry {
                GenreShow::Preview(show) => Some(show.clone()),
                GenreShow::Id(id) => previews.iter().find(|p| &p.id == id).cloned(),
            })
            .collect()
    }
}
