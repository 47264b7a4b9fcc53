// src/publish/metadata.rs
//! Title / description / tags for a published short. Pure and infallible:
//! missing clip fields degrade to defaults, never to empty text.

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::clip::{ClipCandidate, DEFAULT_TITLE};

const TITLE_MAX_CHARS: usize = 100;
/// YouTube "Gaming".
const GAMING_CATEGORY: &str = "20";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub privacy_status: String,
    pub made_for_kids: bool,
    pub embeddable: bool,
    pub license: String,
    pub default_language: String,
}

#[derive(Debug, Clone)]
pub struct MetadataGenerator {
    channel_name: String,
    language: String,
}

impl MetadataGenerator {
    pub fn new(channel_name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            language: language.into(),
        }
    }

    pub fn build(&self, clip: &ClipCandidate, date: NaiveDate) -> VideoMetadata {
        let broadcaster = clip.display_broadcaster();
        let game = clip.display_game();
        let raw_title = clip.display_title();
        let mut clean_title = clean_title(raw_title);
        if clean_title.is_empty() {
            clean_title = DEFAULT_TITLE.to_string();
        }

        let title = cap_title(&format!(
            "{clean_title} by @{broadcaster} | {} - {}",
            self.channel_name,
            date.format("%d %B %Y")
        ));

        let broadcaster_tag = hashtag(broadcaster);
        let game_tag = hashtag(game);
        let description = format!(
            "Best Twitch moments by {broadcaster}!\n\
             This short features one of today's most viewed clips: \"{raw_title}\"\n\
             \n\
             Subscribe for more Twitch shorts every day!\n\
             {broadcaster}'s channel: https://www.twitch.tv/{broadcaster_tag}\n\
             Clip link: {url}\n\
             \n\
             #Twitch #Shorts #TwitchClips #Gaming #{broadcaster_tag} #{game_tag}\n",
            url = clip.source_url,
        );

        VideoMetadata {
            title,
            description,
            tags: build_tags(broadcaster, game, &clean_title),
            category_id: GAMING_CATEGORY.to_string(),
            privacy_status: "public".to_string(),
            made_for_kids: false,
            embeddable: true,
            license: "youtube".to_string(),
            default_language: self.language.clone(),
        }
    }
}

/// Keep letters, digits, whitespace and `'-_!?.`.
pub fn clean_title(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || "'-_!?.".contains(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn cap_title(title: &str) -> String {
    if title.chars().count() <= TITLE_MAX_CHARS {
        return title.to_string();
    }
    let head: String = title.chars().take(TITLE_MAX_CHARS - 3).collect();
    format!("{}...", head.trim_end())
}

fn hashtag(s: &str) -> String {
    static RE: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"[^\p{L}\p{N}_]+").expect("static regex"));
    re.replace_all(s, "").to_string()
}

fn build_tags(broadcaster: &str, game: &str, clean_title: &str) -> Vec<String> {
    let raw = [
        "Twitch",
        "Shorts",
        "TwitchClips",
        "BestOfTwitch",
        "Gaming",
        "Gameplay",
        "Funny",
        "Epic",
        "Highlight",
        broadcaster,
        game,
        "ShortsGaming",
    ];
    let mut tags: Vec<String> = Vec::new();
    for t in raw {
        let t = t.trim().to_lowercase().replace(' ', "-");
        if !t.is_empty() && !tags.contains(&t) {
            tags.push(t);
        }
    }
    for word in clean_title.split_whitespace() {
        let w = word.to_lowercase();
        if w.chars().count() > 2 && w.chars().any(char::is_alphanumeric) && !tags.contains(&w) {
            tags.push(w);
        }
    }
    tags
}
