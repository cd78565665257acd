//! Which episodes were played, and when.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::EpisodeKey;
use crate::store::{load_json, save_json, PreferenceStore, LISTEN_HISTORY_KEY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenRecord {
    pub show_id: String,
    pub season_title: String,
    pub episode_title: String,
    pub last_played_at: DateTime<Utc>,
    #[serde(default = "default_play_count")]
    pub play_count: u32,
}

fn default_play_count() -> u32 {
    1
}

impl ListenRecord {
    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(&self.show_id, &self.season_title, &self.episode_title)
    }

    fn matches(&self, key: &EpisodeKey) -> bool {
        self.show_id == key.show_id
            && self.season_title == key.season_title
            && self.episode_title == key.episode_title
    }
}

pub struct ListeningHistory<S: PreferenceStore> {
    store: S,
    records: Vec<ListenRecord>,
}

impl<S: PreferenceStore> ListeningHistory<S> {
    pub fn load(store: S) -> Self {
        let records: Vec<ListenRecord> = load_json(&store, LISTEN_HISTORY_KEY);
        info!("[history] loaded {} records", records.len());
        Self { store, records }
    }

    /// Most recently played first.
    pub fn records(&self) -> Vec<&ListenRecord> {
        let mut out: Vec<&ListenRecord> = self.records.iter().collect();
        out.sort_by(|a, b| b.last_played_at.cmp(&a.last_played_at));
        out
    }

    pub fn is_listened(&self, key: &EpisodeKey) -> bool {
        self.records.iter().any(|r| r.matches(key))
    }

    pub fn last_played(&self, key: &EpisodeKey) -> Option<DateTime<Utc>> {
        self.records
            .iter()
            .find(|r| r.matches(key))
            .map(|r| r.last_played_at)
    }

    pub fn record_play(&mut self, key: &EpisodeKey, at: DateTime<Utc>) {
        match self.records.iter_mut().find(|r| r.matches(key)) {
            Some(record) => {
                record.last_played_at = at;
                record.play_count = record.play_count.saturating_add(1);
            }
            None => self.records.push(ListenRecord {
                show_id: key.show_id.clone(),
                season_title: key.season_title.clone(),
                episode_title: key.episode_title.clone(),
                last_played_at: at,
                play_count: 1,
            }),
        }
        debug!("[history] played {:?}", key);
        save_json(&mut self.store, LISTEN_HISTORY_KEY, &self.records);
    }

    pub fn clear(&mut self) {
        self.records.clear();
        info!("[history] cleared");
        save_json(&mut self.store, LISTEN_HISTORY_KEY, &self.records);
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }
}
