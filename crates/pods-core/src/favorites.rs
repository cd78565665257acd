//! Starred shows and episodes.
//!
//! `FavoritesStore` is the single owner of both collections. Every mutation
//! goes through its methods, updates memory first, then rewrites the durable
//! copy; consumers only ever see slices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{EpisodeKey, EpisodeSummary, SeasonDetail, ShowDetail};
use crate::store::{
    load_json, save_json, PreferenceStore, FAVORITE_EPISODES_KEY, FAVORITE_SHOWS_KEY,
};

/// A starred episode, with enough show metadata to list it without a fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEpisode {
    pub show_id: String,
    pub show_title: String,
    pub season_title: String,
    pub episode_title: String,
    pub episode_number: u32,
    pub saved_at: DateTime<Utc>,
    /// The show's `updated` stamp when the episode was starred.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl FavoriteEpisode {
    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(&self.show_id, &self.season_title, &self.episode_title)
    }

    pub fn matches(&self, key: &EpisodeKey) -> bool {
        self.show_id == key.show_id
            && self.season_title == key.season_title
            && self.episode_title == key.episode_title
    }
}

/// An episode about to be starred; `saved_at` is stamped by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRef {
    pub show_id: String,
    pub show_title: String,
    pub season_title: String,
    pub episode_title: String,
    pub episode_number: u32,
    pub updated: Option<DateTime<Utc>>,
}

impl EpisodeRef {
    /// Capture an episode from freshly fetched catalog records. `updated` is
    /// copied from the show now and not re-derived later.
    pub fn from_catalog(show: &ShowDetail, season: &SeasonDetail, episode: &EpisodeSummary) -> Self {
        Self {
            show_id: show.id.clone(),
            show_title: show.title.clone(),
            season_title: season.display_title(),
            episode_title: episode.title.clone(),
            episode_number: episode.episode_number,
            updated: show.updated_at,
        }
    }

    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(&self.show_id, &self.season_title, &self.episode_title)
    }

    fn stamp(self, now: DateTime<Utc>) -> FavoriteEpisode {
        FavoriteEpisode {
            show_id: self.show_id,
            show_title: self.show_title,
            season_title: self.season_title,
            episode_title: self.episode_title,
            episode_number: self.episode_number,
            saved_at: now,
            updated: self.updated,
        }
    }
}

pub struct FavoritesStore<S: PreferenceStore> {
    store: S,
    shows: Vec<String>,
    episodes: Vec<FavoriteEpisode>,
}

impl<S: PreferenceStore> FavoritesStore<S> {
    /// Read both collections from `store`. Missing or malformed payloads
    /// start empty; repeated ids or episode identities collapse to one entry.
    pub fn load(store: S) -> Self {
        let raw_shows: Vec<String> = load_json(&store, FAVORITE_SHOWS_KEY);
        let raw_episodes: Vec<FavoriteEpisode> = load_json(&store, FAVORITE_EPISODES_KEY);

        let mut shows: Vec<String> = Vec::with_capacity(raw_shows.len());
        for id in raw_shows {
            if !shows.contains(&id) {
                shows.push(id);
            }
        }

        let mut episodes: Vec<FavoriteEpisode> = Vec::with_capacity(raw_episodes.len());
        for ep in raw_episodes {
            let key = ep.key();
            match episodes.iter_mut().find(|e| e.matches(&key)) {
                Some(existing) => *existing = ep,
                None => episodes.push(ep),
            }
        }

        info!(
            "[favorites] loaded {} shows, {} episodes",
            shows.len(),
            episodes.len()
        );
        Self {
            store,
            shows,
            episodes,
        }
    }

    pub fn shows(&self) -> &[String] {
        &self.shows
    }

    pub fn episodes(&self) -> &[FavoriteEpisode] {
        &self.episodes
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    // ── shows ────────────────────────────────────────────────────────────────

    pub fn is_show_favorite(&self, show_id: &str) -> bool {
        self.shows.iter().any(|id| id == show_id)
    }

    /// Flip membership of `show_id`. Returns whether it is a favorite now.
    pub fn toggle_show(&mut self, show_id: &str) -> bool {
        if self.is_show_favorite(show_id) {
            self.remove_show(show_id);
            false
        } else {
            self.add_show(show_id);
            true
        }
    }

    /// Returns false if the show was already a favorite.
    pub fn add_show(&mut self, show_id: &str) -> bool {
        if self.is_show_favorite(show_id) {
            return false;
        }
        self.shows.push(show_id.to_string());
        debug!("[favorites] starred show {}", show_id);
        self.persist_shows();
        true
    }

    /// Returns false if the show was not a favorite.
    pub fn remove_show(&mut self, show_id: &str) -> bool {
        let before = self.shows.len();
        self.shows.retain(|id| id != show_id);
        if self.shows.len() == before {
            return false;
        }
        debug!("[favorites] unstarred show {}", show_id);
        self.persist_shows();
        true
    }

    // ── episodes ─────────────────────────────────────────────────────────────

    pub fn is_episode_favorite(&self, key: &EpisodeKey) -> bool {
        self.episodes.iter().any(|e| e.matches(key))
    }

    /// Flip membership of the episode. Returns whether it is a favorite now.
    pub fn toggle_episode(&mut self, episode: EpisodeRef) -> bool {
        self.toggle_episode_at(episode, Utc::now())
    }

    pub fn toggle_episode_at(&mut self, episode: EpisodeRef, now: DateTime<Utc>) -> bool {
        let key = episode.key();
        if self.is_episode_favorite(&key) {
            self.remove_episode(&key);
            false
        } else {
            self.add_episode_at(episode, now);
            true
        }
    }

    pub fn add_episode(&mut self, episode: EpisodeRef) {
        self.add_episode_at(episode, Utc::now());
    }

    /// Star an episode. An existing record with the same identity is updated
    /// in place: it keeps its `saved_at` and takes the new metadata.
    pub fn add_episode_at(&mut self, episode: EpisodeRef, now: DateTime<Utc>) {
        let key = episode.key();
        match self.episodes.iter_mut().find(|e| e.matches(&key)) {
            Some(existing) => {
                existing.show_title = episode.show_title;
                existing.episode_number = episode.episode_number;
                existing.updated = episode.updated;
                debug!("[favorites] refreshed episode {:?}", key);
            }
            None => {
                self.episodes.push(episode.stamp(now));
                debug!("[favorites] starred episode {:?}", key);
            }
        }
        self.persist_episodes();
    }

    /// Returns false if the episode was not a favorite.
    pub fn remove_episode(&mut self, key: &EpisodeKey) -> bool {
        let before = self.episodes.len();
        self.episodes.retain(|e| !e.matches(key));
        if self.episodes.len() == before {
            return false;
        }
        debug!("[favorites] unstarred episode {:?}", key);
        self.persist_episodes();
        true
    }

    fn persist_shows(&mut self) {
        save_json(&mut self.store, FAVORITE_SHOWS_KEY, &self.shows);
    }

    fn persist_episodes(&mut self) {
        save_json(&mut self.store, FAVORITE_EPISODES_KEY, &self.episodes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn episode(show: &str, season: &str, title: &str) -> EpisodeRef {
        EpisodeRef {
            show_id: show.into(),
            show_title: format!("Show {show}"),
            season_title: season.into(),
            episode_title: title.into(),
            episode_number: 1,
            updated: Some(ts(1_000)),
        }
    }

    #[test]
    fn test_toggle_show_twice_restores_membership() {
        let mut favs = FavoritesStore::load(MemoryStore::new());
        assert!(favs.toggle_show("10716"));
        assert!(favs.is_show_favorite("10716"));
        assert!(!favs.toggle_show("10716"));
        assert!(!favs.is_show_favorite("10716"));
        assert!(favs.shows().is_empty());
    }

    #[test]
    fn test_show_toggle_is_persisted() {
        let mut favs = FavoritesStore::load(MemoryStore::new());
        favs.toggle_show("1");
        favs.toggle_show("2");
        assert_eq!(favs.store().raw(FAVORITE_SHOWS_KEY), Some(r#"["1","2"]"#));
        favs.toggle_show("1");
        assert_eq!(favs.store().raw(FAVORITE_SHOWS_KEY), Some(r#"["2"]"#));
    }

    #[test]
    fn test_episode_toggle_flips_is_favorite() {
        let mut favs = FavoritesStore::load(MemoryStore::new());
        let ep = episode("7", "Season 1", "Pilot");
        let key = ep.key();

        assert!(favs.toggle_episode_at(ep.clone(), ts(2_000)));
        assert!(favs.is_episode_favorite(&key));
        assert_eq!(favs.episodes()[0].saved_at, ts(2_000));

        assert!(!favs.toggle_episode_at(ep, ts(3_000)));
        assert!(!favs.is_episode_favorite(&key));
    }

    #[test]
    fn test_identity_ignores_payload_fields() {
        let mut favs = FavoritesStore::load(MemoryStore::new());
        favs.add_episode_at(episode("7", "Season 1", "Pilot"), ts(2_000));

        let mut renumbered = episode("7", "Season 1", "Pilot");
        renumbered.episode_number = 9;
        renumbered.updated = Some(ts(5_000));
        assert!(favs.is_episode_favorite(&renumbered.key()));

        // same title in another season is a different episode
        assert!(!favs.is_episode_favorite(&EpisodeKey::new("7", "Season 2", "Pilot")));
    }

    #[test]
    fn test_readd_updates_in_place() {
        let mut favs = FavoritesStore::load(MemoryStore::new());
        favs.add_episode_at(episode("7", "Season 1", "Pilot"), ts(2_000));

        let mut newer = episode("7", "Season 1", "Pilot");
        newer.updated = Some(ts(9_000));
        favs.add_episode_at(newer, ts(10_000));

        assert_eq!(favs.episodes().len(), 1);
        let stored = &favs.episodes()[0];
        assert_eq!(stored.updated, Some(ts(9_000)));
        assert_eq!(stored.saved_at, ts(2_000));
    }

    #[test]
    fn test_load_not_json_is_empty() {
        let store = MemoryStore::new()
            .with(FAVORITE_SHOWS_KEY, "not json")
            .with(FAVORITE_EPISODES_KEY, "not json");
        let favs = FavoritesStore::load(store);
        assert!(favs.shows().is_empty());
        assert!(favs.episodes().is_empty());
    }

    #[test]
    fn test_load_collapses_duplicates() {
        let payload = r#"[
            {"showId":"7","showTitle":"A","seasonTitle":"S1","episodeTitle":"E",
             "episodeNumber":1,"savedAt":"2024-01-01T00:00:00Z","updated":"2023-01-01T00:00:00Z"},
            {"showId":"7","showTitle":"A","seasonTitle":"S1","episodeTitle":"E",
             "episodeNumber":1,"savedAt":"2024-01-01T00:00:00Z","updated":"2023-06-01T00:00:00Z"}
        ]"#;
        let store = MemoryStore::new()
            .with(FAVORITE_SHOWS_KEY, r#"["1","1","2"]"#)
            .with(FAVORITE_EPISODES_KEY, payload);
        let favs = FavoritesStore::load(store);
        assert_eq!(favs.shows(), &["1".to_string(), "2".to_string()]);
        assert_eq!(favs.episodes().len(), 1);
        assert_eq!(
            favs.episodes()[0].updated.unwrap().to_rfc3339(),
            "2023-06-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_failed_write_keeps_memory_state() {
        let mut favs = FavoritesStore::load(MemoryStore::new().read_only());
        assert!(favs.toggle_show("1"));
        assert!(favs.is_show_favorite("1"));
        assert!(favs.store().raw(FAVORITE_SHOWS_KEY).is_none());

        let ep = episode("1", "Season 1", "E");
        assert!(favs.toggle_episode(ep.clone()));
        assert!(favs.is_episode_favorite(&ep.key()));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut favs = FavoritesStore::load(MemoryStore::new());
        assert!(!favs.remove_show("nope"));
        assert!(!favs.remove_episode(&EpisodeKey::new("a", "b", "c")));
        assert!(favs.store().raw(FAVORITE_SHOWS_KEY).is_none());
    }

    #[test]
    fn test_from_catalog_copies_show_updated() {
        let show: ShowDetail = serde_json::from_str(
            r#"{"id":"9","title":"Nine","updated":"2022-10-26T00:00:00Z","seasons":[
                {"season":1,"title":"Season 1","episodes":[
                    {"episode":4,"title":"Four","file":"https://example.test/4.mp3"}]}]}"#,
        )
        .unwrap();
        let season = show.season(1).unwrap();
        let ep = EpisodeRef::from_catalog(&show, season, season.episode(4).unwrap());
        assert_eq!(ep.key(), EpisodeKey::new("9", "Season 1", "Four"));
        assert_eq!(ep.episode_number, 4);
        assert_eq!(ep.updated, show.updated_at);
    }
}
