//! Podcast catalog API client

use futures_util::future::join_all;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{GenreDetail, SeasonDetail, ShowDetail, ShowSummary};
use crate::config::CatalogConfig;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },
    #[error("failed to parse response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// True when the catalog answered 404 for the requested record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(concat!("pods/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(CatalogError::Client)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All show previews (`GET /`).
    pub async fn fetch_previews(&self) -> Result<Vec<ShowSummary>, CatalogError> {
        let previews: Vec<ShowSummary> = self.get_json("/").await?;
        info!("[catalog] fetched {} previews", previews.len());
        Ok(previews)
    }

    pub async fn fetch_genre(&self, genre_id: u32) -> Result<GenreDetail, CatalogError> {
        self.get_json(&format!("/genre/{}", genre_id)).await
    }

    /// Fetch several genres concurrently. Failed genres are logged and left
    /// out; the rest come back in request order.
    pub async fn fetch_genres(&self, genre_ids: &[u32]) -> Vec<GenreDetail> {
        let results = join_all(genre_ids.iter().map(|&id| self.fetch_genre(id))).await;
        genre_ids
            .iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(genre) => Some(genre),
                Err(e) => {
                    warn!("[catalog] genre {} unavailable: {}", id, e);
                    None
                }
            })
            .collect()
    }

    /// Full show record with seasons and episodes (`GET /id/{id}`).
    pub async fn fetch_show(&self, show_id: &str) -> Result<ShowDetail, CatalogError> {
        let show: ShowDetail = self.get_json(&format!("/id/{}", show_id)).await?;
        debug!(
            "[catalog] show {} has {} seasons, {} episodes",
            show.id,
            show.seasons.len(),
            show.episode_count()
        );
        Ok(show)
    }

    pub async fn fetch_season(&self, season_id: &str) -> Result<SeasonDetail, CatalogError> {
        self.get_json(&format!("/season/{}", season_id)).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("[catalog] GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| CatalogError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status { url, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| CatalogError::Request {
                url: url.clone(),
                source,
            })?;

        serde_json::from_str(&body).map_err(|source| CatalogError::Decode { url, source })
    }
}
