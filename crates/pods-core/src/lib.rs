//! Podcast catalog client: catalog records and API access, the favorites and
//! listening-history stores, and the listing filter/sort pipeline.

pub mod api;
pub mod catalog;
pub mod config;
pub mod favorites;
pub mod history;
pub mod platform;
pub mod query;
pub mod store;

pub use api::{CatalogClient, CatalogError};
pub use catalog::{
    EpisodeKey, EpisodeSummary, GenreDetail, SeasonDetail, ShowDetail, ShowSummary,
};
pub use favorites::{EpisodeRef, FavoriteEpisode, FavoritesStore};
pub use history::{ListenRecord, ListeningHistory};
pub use query::{ListQuery, Listing, SortOrder};
pub use store::{FileStore, MemoryStore, PreferenceStore, StoreError};
