//! Plain-text rows for terminal listings.

use chrono::{DateTime, Utc};
use pods_core::catalog::genre_title;
use pods_core::{EpisodeSummary, FavoriteEpisode, ListenRecord, ShowSummary};
use std::collections::BTreeSet;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const TITLE_WIDTH: usize = 40;
const GENRES_WIDTH: usize = 30;

/// Truncate or pad `s` to exactly `width` display columns.
pub fn fit(s: &str, width: usize) -> String {
    if s.width() <= width {
        let mut out = s.to_string();
        out.push_str(&" ".repeat(width - s.width()));
        return out;
    }

    let mut out = String::new();
    let mut current_width = 0;
    // leave a column for the ellipsis
    let budget = width.saturating_sub(1);
    for ch in s.chars() {
        let char_width = ch.width().unwrap_or(0);
        if current_width + char_width > budget {
            break;
        }
        out.push(ch);
        current_width += char_width;
    }
    if width > 0 {
        out.push('…');
        current_width += 1;
    }
    while current_width < width {
        out.push(' ');
        current_width += 1;
    }
    out
}

pub fn date(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d").to_string(),
        None => "unknown".to_string(),
    }
}

pub fn genre_names(ids: &BTreeSet<u32>) -> String {
    let names: Vec<&str> = ids.iter().filter_map(|id| genre_title(*id)).collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

fn star(favorite: bool) -> char {
    if favorite {
        '★'
    } else {
        ' '
    }
}

pub fn show_row(show: &ShowSummary, favorite: bool) -> String {
    let seasons = match show.season_count {
        Some(1) => "1 season".to_string(),
        Some(n) => format!("{} seasons", n),
        None => "-".to_string(),
    };
    format!(
        "{} {:>6}  {}  {}  {:<10}  {}",
        star(favorite),
        show.id,
        fit(&show.title, TITLE_WIDTH),
        fit(&genre_names(&show.genre_ids), GENRES_WIDTH),
        seasons,
        date(show.updated_at)
    )
}

pub fn episode_row(episode: &EpisodeSummary, favorite: bool, listened: bool) -> String {
    let played = if listened { "played" } else { "" };
    format!(
        "  {} {:>3}. {}  {}",
        star(favorite),
        episode.episode_number,
        fit(&episode.title, TITLE_WIDTH),
        played
    )
    .trim_end()
    .to_string()
}

pub fn favorite_episode_row(episode: &FavoriteEpisode) -> String {
    format!(
        "★ {}  {}  E{:<3} {}  saved {}",
        fit(&episode.show_title, 24),
        fit(&episode.season_title, 16),
        episode.episode_number,
        fit(&episode.episode_title, TITLE_WIDTH),
        date(Some(episode.saved_at))
    )
}

pub fn history_row(record: &ListenRecord) -> String {
    let times = if record.play_count == 1 {
        "1 play".to_string()
    } else {
        format!("{} plays", record.play_count)
    };
    format!(
        "{}  {:>6}  {}  {}  {}",
        record.last_played_at.format("%Y-%m-%d %H:%M"),
        record.show_id,
        fit(&record.season_title, 16),
        fit(&record.episode_title, TITLE_WIDTH),
        times
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fit_pads_short_text() {
        assert_eq!(fit("abc", 6), "abc   ");
    }

    #[test]
    fn test_fit_truncates_with_ellipsis() {
        assert_eq!(fit("abcdefgh", 5), "abcd…");
        assert_eq!(fit("abcdefgh", 5).width(), 5);
    }

    #[test]
    fn test_fit_counts_wide_chars() {
        // each CJK char is two columns wide
        let out = fit("日本語のポッドキャスト", 7);
        assert_eq!(out.width(), 7);
        assert!(out.starts_with("日本語"));
    }

    #[test]
    fn test_genre_names_skip_unknown() {
        let ids: BTreeSet<u32> = [1, 6, 42].into_iter().collect();
        assert_eq!(genre_names(&ids), "Personal Growth, Business");
        assert_eq!(genre_names(&BTreeSet::new()), "-");
    }

    #[test]
    fn test_missing_date() {
        assert_eq!(date(None), "unknown");
        let ts = Utc.with_ymd_and_hms(2022, 11, 3, 7, 0, 0).unwrap();
        assert_eq!(date(Some(ts)), "2022-11-03");
    }

    #[test]
    fn test_episode_row_marks() {
        let ep = EpisodeSummary {
            episode_number: 3,
            title: "Third".into(),
            description: String::new(),
            audio_url: "https://example.test/3.mp3".into(),
        };
        let row = episode_row(&ep, true, true);
        assert!(row.contains('★'));
        assert!(row.ends_with("played"));
        assert!(!episode_row(&ep, false, false).contains('★'));
    }
}
