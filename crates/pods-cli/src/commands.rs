//! Subcommand handlers. Each writes plain text to the session's output.

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use pods_core::catalog::GENRE_TITLES;
use pods_core::config::Config;
use pods_core::{
    CatalogClient, EpisodeKey, EpisodeRef, EpisodeSummary, FavoritesStore, FileStore, ListQuery,
    ListeningHistory, SeasonDetail, ShowDetail, ShowSummary, SortOrder,
};
use std::io::Write;
use tracing::{info, warn};

use crate::cli::{Command, FavTarget};
use crate::player;
use crate::render;

pub struct Session<W: Write> {
    config: Config,
    client: CatalogClient,
    favorites: FavoritesStore<FileStore>,
    history: ListeningHistory<FileStore>,
    out: W,
}

impl<W: Write> Session<W> {
    pub fn open(config: Config, out: W) -> anyhow::Result<Self> {
        let client = CatalogClient::new(&config.catalog).context("creating catalog client")?;
        let data_dir = config.paths.data_dir.clone();
        Ok(Self {
            favorites: FavoritesStore::load(FileStore::new(&data_dir)),
            history: ListeningHistory::load(FileStore::new(&data_dir)),
            client,
            config,
            out,
        })
    }

    pub async fn run(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Shows {
                query,
                genre,
                sort,
                favorites,
            } => self.shows(query, genre, sort, favorites).await,
            Command::Genres => self.genres().await,
            Command::Genre { id, sort } => self.genre(id, sort).await,
            Command::Show { id, season } => self.show(&id, season).await,
            Command::Season { id } => self.season(&id).await,
            Command::Fav { target } => self.fav(target).await,
            Command::Favorites { query, sort } => self.list_favorites(query, sort).await,
            Command::Play {
                show_id,
                season,
                episode,
            } => self.play(&show_id, season, episode).await,
            Command::History { clear } => self.list_history(clear),
        }
    }

    fn sort_or(&self, sort: Option<String>, fallback: &str) -> SortOrder {
        SortOrder::from_label(sort.as_deref().unwrap_or(fallback))
    }

    fn print_shows(&mut self, shows: &[ShowSummary]) -> anyhow::Result<()> {
        if shows.is_empty() {
            writeln!(self.out, "no shows match")?;
            return Ok(());
        }
        for show in shows {
            let favorite = self.favorites.is_show_favorite(&show.id);
            writeln!(self.out, "{}", render::show_row(show, favorite))?;
        }
        Ok(())
    }

    // ── catalog listings ─────────────────────────────────────────────────────

    async fn shows(
        &mut self,
        query: Option<String>,
        genre: Option<u32>,
        sort: Option<String>,
        favorites_only: bool,
    ) -> anyhow::Result<()> {
        let previews = self
            .client
            .fetch_previews()
            .await
            .context("failed to load shows")?;

        let mut list_query = ListQuery::new()
            .text(search_text(query))
            .genre(genre)
            .sort(self.sort_or(sort, &self.config.display.default_sort));
        if favorites_only {
            list_query = list_query.only_ids(self.favorites.shows());
        }

        self.print_shows(&list_query.apply(&previews))
    }

    async fn genres(&mut self) -> anyhow::Result<()> {
        let ids: Vec<u32> = GENRE_TITLES.iter().map(|(id, _)| *id).collect();
        let genres = self.client.fetch_genres(&ids).await;
        if genres.is_empty() {
            bail!("failed to load genres");
        }
        for genre in &genres {
            writeln!(
                self.out,
                "{:>2}  {}  {} shows",
                genre.id,
                render::fit(&genre.title, 26),
                genre.shows.len()
            )?;
        }
        if genres.len() < ids.len() {
            writeln!(self.out, "({} genres unavailable)", ids.len() - genres.len())?;
        }
        Ok(())
    }

    async fn genre(&mut self, id: u32, sort: Option<String>) -> anyhow::Result<()> {
        let (genre, previews) =
            tokio::try_join!(self.client.fetch_genre(id), self.client.fetch_previews())
                .with_context(|| format!("failed to load genre {}", id))?;

        writeln!(self.out, "{}", genre.title)?;
        if !genre.description.is_empty() {
            writeln!(self.out, "{}", genre.description)?;
        }
        writeln!(self.out)?;

        let shows = ListQuery::new()
            .sort(self.sort_or(sort, &self.config.display.default_sort))
            .apply(&genre.resolve_shows(&previews));
        self.print_shows(&shows)
    }

    // ── show detail ──────────────────────────────────────────────────────────

    async fn fetch_show(&self, show_id: &str) -> anyhow::Result<ShowDetail> {
        self.client
            .fetch_show(show_id)
            .await
            .with_context(|| format!("failed to load show {}", show_id))
    }

    fn print_season(&mut self, show_id: Option<&str>, season: &SeasonDetail) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "{} ({} episodes)",
            season.display_title(),
            season.episodes.len()
        )?;
        if season.episodes.is_empty() {
            writeln!(self.out, "  none available")?;
            return Ok(());
        }
        for episode in &season.episodes {
            let (favorite, listened) = match show_id {
                Some(show_id) => {
                    let key = EpisodeKey::of(show_id, season, episode);
                    (
                        self.favorites.is_episode_favorite(&key),
                        self.history.is_listened(&key),
                    )
                }
                None => (false, false),
            };
            writeln!(self.out, "{}", render::episode_row(episode, favorite, listened))?;
        }
        Ok(())
    }

    async fn show(&mut self, show_id: &str, season_number: Option<u32>) -> anyhow::Result<()> {
        let show = self.fetch_show(show_id).await?;

        let star = if self.favorites.is_show_favorite(&show.id) {
            " ★"
        } else {
            ""
        };
        writeln!(self.out, "{}{}", show.title, star)?;
        if !show.genres.is_empty() {
            writeln!(self.out, "{}", show.genres.join(", "))?;
        }
        writeln!(self.out, "updated {}", render::date(show.updated_at))?;
        if !show.description.is_empty() {
            writeln!(self.out)?;
            writeln!(self.out, "{}", show.description)?;
        }
        writeln!(self.out)?;

        if show.seasons.is_empty() {
            writeln!(self.out, "no seasons available")?;
            return Ok(());
        }

        match season_number {
            Some(n) => {
                let season = show
                    .season(n)
                    .ok_or_else(|| anyhow!("{} has no season {}", show.title, n))?;
                self.print_season(Some(&show.id), season)?;
            }
            None => {
                for season in &show.seasons {
                    self.print_season(Some(&show.id), season)?;
                    writeln!(self.out)?;
                }
            }
        }
        Ok(())
    }

    async fn season(&mut self, season_id: &str) -> anyhow::Result<()> {
        let season = self
            .client
            .fetch_season(season_id)
            .await
            .with_context(|| format!("failed to load season {}", season_id))?;
        self.print_season(None, &season)
    }

    // ── favorites ────────────────────────────────────────────────────────────

    async fn fav(&mut self, target: FavTarget) -> anyhow::Result<()> {
        match target {
            FavTarget::Show { id } => {
                let now = self.favorites.toggle_show(&id);
                info!("[favorites] show {} starred={}", id, now);
                writeln!(
                    self.out,
                    "{} show {}",
                    if now { "starred" } else { "unstarred" },
                    id
                )?;
            }
            FavTarget::Episode {
                show_id,
                season,
                episode,
            } => {
                let show = self.fetch_show(&show_id).await?;
                let episode_ref = {
                    let (season, episode) = locate(&show, season, episode)?;
                    EpisodeRef::from_catalog(&show, season, episode)
                };
                let label = format!(
                    "{} / {} / {}",
                    episode_ref.show_title, episode_ref.season_title, episode_ref.episode_title
                );
                let now = self.favorites.toggle_episode(episode_ref);
                writeln!(
                    self.out,
                    "{} {}",
                    if now { "starred" } else { "unstarred" },
                    label
                )?;
            }
        }
        Ok(())
    }

    async fn list_favorites(
        &mut self,
        query: Option<String>,
        sort: Option<String>,
    ) -> anyhow::Result<()> {
        let text = search_text(query);
        let order = self.sort_or(sort, &self.config.display.favorites_sort);

        writeln!(self.out, "shows")?;
        if self.favorites.shows().is_empty() {
            writeln!(self.out, "  none")?;
        } else {
            let previews = self
                .client
                .fetch_previews()
                .await
                .context("failed to load favorite shows")?;
            let shows = ListQuery::new()
                .text(text.clone())
                .only_ids(self.favorites.shows())
                .sort(order)
                .apply(&previews);
            self.print_shows(&shows)?;

            let missing = self
                .favorites
                .shows()
                .iter()
                .filter(|id| !previews.iter().any(|p| &p.id == *id))
                .count();
            if missing > 0 {
                warn!("[favorites] {} starred shows no longer in catalog", missing);
            }
        }

        writeln!(self.out)?;
        writeln!(self.out, "episodes")?;
        let episodes = ListQuery::new()
            .text(text)
            .sort(order)
            .apply(self.favorites.episodes());
        if episodes.is_empty() {
            writeln!(self.out, "  none")?;
        }
        for episode in &episodes {
            writeln!(self.out, "{}", render::favorite_episode_row(episode))?;
        }
        Ok(())
    }

    // ── playback ─────────────────────────────────────────────────────────────

    async fn play(&mut self, show_id: &str, season: u32, episode: u32) -> anyhow::Result<()> {
        let show = self.fetch_show(show_id).await?;
        let (season, episode) = locate(&show, season, episode)?;
        if episode.audio_url.is_empty() {
            bail!("{} has no audio file", episode.title);
        }
        let key = EpisodeKey::of(&show.id, season, episode);

        writeln!(
            self.out,
            "playing {} / {} / {}",
            show.title, key.season_title, key.episode_title
        )?;
        self.out.flush()?;
        player::play(&self.config.player, &episode.audio_url).await?;
        self.history.record_play(&key, Utc::now());
        Ok(())
    }

    fn list_history(&mut self, clear: bool) -> anyhow::Result<()> {
        if clear {
            self.history.clear();
            writeln!(self.out, "history cleared")?;
            return Ok(());
        }
        let records = self.history.records();
        if records.is_empty() {
            writeln!(self.out, "nothing played yet")?;
        }
        for record in records {
            writeln!(self.out, "{}", render::history_row(record))?;
        }
        Ok(())
    }
}

/// Search text typed on the command line; surrounding whitespace is dropped.
fn search_text(query: Option<String>) -> String {
    query.as_deref().map(str::trim).unwrap_or_default().to_string()
}

/// Find a season and episode of `show` by their catalog numbers.
fn locate(
    show: &ShowDetail,
    season: u32,
    episode: u32,
) -> anyhow::Result<(&SeasonDetail, &EpisodeSummary)> {
    let season_detail = show
        .season(season)
        .ok_or_else(|| anyhow!("{} has no season {}", show.title, season))?;
    let episode_detail = season_detail.episode(episode).ok_or_else(|| {
        anyhow!(
            "{} has no episode {}",
            season_detail.display_title(),
            episode
        )
    })?;
    Ok((season_detail, episode_detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    fn show() -> ShowDetail {
        serde_json::from_str(
            r#"{"id":"9","title":"Nine","seasons":[
                {"season":1,"title":"","episodes":[
                    {"episode":1,"title":"One","file":"https://example.test/1.mp3"},
                    {"episode":2,"title":"Two","file":"https://example.test/2.mp3"}]}]}"#,
        )
        .unwrap()
    }

    async fn previews() -> Json<serde_json::Value> {
        Json(json!([
            {"id": "1", "title": "Daily Brief", "genres": [8], "updated": "2023-01-01T00:00:00Z"},
            {"id": "2", "title": "Night Owls", "genres": [5], "updated": "2022-01-01T00:00:00Z"}
        ]))
    }

    async fn show_detail(Path(id): Path<String>) -> impl IntoResponse {
        match id.as_str() {
            "1" => Json(json!({
                "id": "1", "title": "Daily Brief",
                "updated": "2023-01-01T00:00:00Z",
                "seasons": [
                    {"season": 1, "title": "Season 1", "episodes": [
                        {"episode": 1, "title": "Monday", "file": "https://example.test/m.mp3"},
                        {"episode": 2, "title": "Tuesday", "file": "https://example.test/t.mp3"}
                    ]},
                    {"season": 2, "title": "Season 2", "episodes": []}
                ]
            }))
            .into_response(),
            "2" => Json(json!({"id": "2", "title": "Night Owls"})).into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    /// Session over a fixture catalog and a fresh data dir.
    async fn session(dir: &TempDir) -> Session<Vec<u8>> {
        let app = Router::new()
            .route("/", get(previews))
            .route("/id/:id", get(show_detail));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut config = Config::default();
        config.catalog.base_url = format!("http://{}", addr);
        config.catalog.timeout_secs = 5;
        config.paths.data_dir = dir.path().to_path_buf();
        Session::open(config, Vec::new()).unwrap()
    }

    fn output(session: &mut Session<Vec<u8>>) -> String {
        String::from_utf8(std::mem::take(&mut session.out)).unwrap()
    }

    #[test]
    fn test_locate_episode() {
        let show = show();
        let (season, episode) = locate(&show, 1, 2).unwrap();
        assert_eq!(season.display_title(), "Season 1");
        assert_eq!(episode.title, "Two");
    }

    #[test]
    fn test_locate_missing() {
        let show = show();
        let err = locate(&show, 3, 1).unwrap_err();
        assert_eq!(err.to_string(), "Nine has no season 3");
        let err = locate(&show, 1, 9).unwrap_err();
        assert_eq!(err.to_string(), "Season 1 has no episode 9");
    }

    #[test]
    fn test_search_text_trims_command_line_input() {
        assert_eq!(search_text(Some("  daily ".into())), "daily");
        assert_eq!(search_text(None), "");
    }

    #[tokio::test]
    async fn test_show_without_seasons() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir).await;
        session
            .run(Command::Show {
                id: "2".into(),
                season: None,
            })
            .await
            .unwrap();
        assert!(output(&mut session).contains("no seasons available"));
    }

    #[tokio::test]
    async fn test_empty_season_prints_none_available() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir).await;
        session
            .run(Command::Show {
                id: "1".into(),
                season: Some(2),
            })
            .await
            .unwrap();
        let out = output(&mut session);
        assert!(out.contains("Season 2 (0 episodes)"));
        assert!(out.contains("none available"));
    }

    #[tokio::test]
    async fn test_unknown_show_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir).await;
        let err = session
            .run(Command::Show {
                id: "404".into(),
                season: None,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to load show 404"));
    }

    #[tokio::test]
    async fn test_favorites_only_listing() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir).await;
        session
            .run(Command::Fav {
                target: FavTarget::Show { id: "2".into() },
            })
            .await
            .unwrap();
        output(&mut session);

        session
            .run(Command::Shows {
                query: None,
                genre: None,
                sort: None,
                favorites: true,
            })
            .await
            .unwrap();
        let out = output(&mut session);
        assert!(out.contains("Night Owls"));
        assert!(!out.contains("Daily Brief"));
    }

    #[tokio::test]
    async fn test_favorite_episodes_filtered_by_query() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir).await;
        for episode in [1, 2] {
            session
                .run(Command::Fav {
                    target: FavTarget::Episode {
                        show_id: "1".into(),
                        season: 1,
                        episode,
                    },
                })
                .await
                .unwrap();
        }
        assert!(output(&mut session).contains("starred Daily Brief / Season 1 / Tuesday"));

        session
            .run(Command::Favorites {
                query: Some(" tues ".into()),
                sort: None,
            })
            .await
            .unwrap();
        let out = output(&mut session);
        assert!(out.contains("Tuesday"));
        assert!(!out.contains("Monday"));
    }

    #[tokio::test]
    async fn test_history_clear_persists() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir).await;
        session.run(Command::History { clear: false }).await.unwrap();
        assert!(output(&mut session).contains("nothing played yet"));

        session.run(Command::History { clear: true }).await.unwrap();
        assert!(dir.path().join("listenHistory.json").exists());
    }
}
