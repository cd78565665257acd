use clap::{Parser, Subcommand};
use pods_core::catalog::{genre_id_by_title, genre_title};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pods")]
#[command(version)]
#[command(about = "Browse a podcast catalog, keep favorites and play episodes", long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List shows from the catalog
    Shows {
        /// Only titles containing this text (case-insensitive)
        #[arg(short, long)]
        query: Option<String>,
        /// Genre id (1-9) or title
        #[arg(short, long, value_parser = parse_genre)]
        genre: Option<u32>,
        /// a-z, z-a, newest or oldest
        #[arg(short, long)]
        sort: Option<String>,
        /// Only starred shows
        #[arg(long)]
        favorites: bool,
    },
    /// List genres with their show counts
    Genres,
    /// List the shows in one genre
    Genre {
        #[arg(value_parser = parse_genre)]
        id: u32,
        #[arg(short, long)]
        sort: Option<String>,
    },
    /// Show details, seasons and episodes
    Show {
        id: String,
        /// Only this season
        #[arg(long)]
        season: Option<u32>,
    },
    /// List a season's episodes by season id
    Season { id: String },
    /// Star or unstar a show or an episode
    Fav {
        #[command(subcommand)]
        target: FavTarget,
    },
    /// List starred shows and episodes
    Favorites {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long)]
        sort: Option<String>,
    },
    /// Play an episode with mpv
    Play {
        show_id: String,
        season: u32,
        episode: u32,
    },
    /// List played episodes
    History {
        /// Forget all plays
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum FavTarget {
    Show {
        id: String,
    },
    Episode {
        show_id: String,
        season: u32,
        episode: u32,
    },
}

/// Parse a genre given as its id or its title
fn parse_genre(s: &str) -> Result<u32, String> {
    if let Ok(id) = s.trim().parse::<u32>() {
        return match genre_title(id) {
            Some(_) => Ok(id),
            None => Err(format!("Unknown genre id {}: expected 1-9", id)),
        };
    }
    genre_id_by_title(s).ok_or_else(|| format!("Unknown genre '{}'", s))
}
