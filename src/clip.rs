// src/clip.rs
//! Clip candidate model shared by ingest, filtering, ranking and the run loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "An epic moment";
pub const DEFAULT_BROADCASTER: &str = "A streamer";
pub const DEFAULT_GAME: &str = "Gaming";

/// One clip as reported by the upstream platform. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClipCandidate {
    pub id: String,
    /// Locator handed to the downloader.
    pub source_url: String,
    pub title: Option<String>,
    pub broadcaster_id: Option<String>,
    pub broadcaster_name: Option<String>,
    pub game_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub view_count: u64,
    pub duration_seconds: f64,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl ClipCandidate {
    pub fn display_title(&self) -> &str {
        non_blank(self.title.as_deref()).unwrap_or(DEFAULT_TITLE)
    }

    pub fn display_broadcaster(&self) -> &str {
        non_blank(self.broadcaster_name.as_deref()).unwrap_or(DEFAULT_BROADCASTER)
    }

    pub fn display_game(&self) -> &str {
        non_blank(self.game_name.as_deref()).unwrap_or(DEFAULT_GAME)
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|t| !t.is_empty())
}
