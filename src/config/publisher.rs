// src/config/publisher.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::filter::FilterCriteria;

pub const ENV_CONFIG_PATH: &str = "PUBLISHER_CONFIG_PATH";
pub const ENV_PUBLISH_QUOTA: &str = "PUBLISH_QUOTA";

const RAW_CLIP_FILE: &str = "temp_raw_clip.mp4";
const PROCESSED_CLIP_FILE: &str = "temp_processed_short.mp4";

/// Static run configuration. Every field has a default, so a partial file
/// only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Max successful publishes per run.
    pub publish_quota: usize,
    pub broadcaster_ids: Vec<String>,
    pub game_ids: Vec<String>,
    pub language: String,
    pub min_duration_secs: f64,
    pub max_duration_secs: f64,
    /// Trailing window for clip creation time.
    pub window_days: u32,
    pub clips_per_source: u32,
    pub data_dir: PathBuf,
    /// Relative paths resolve against `data_dir`.
    pub history_file: PathBuf,
    pub channel_name: String,
    /// Prune history buckets older than this many days; `None` keeps everything.
    pub history_retention_days: Option<u32>,
    /// Upper bound for each download/render/auth/upload call.
    pub collaborator_timeout_secs: Option<u64>,
    /// Prometheus text dump written at the end of a run.
    pub metrics_textfile: Option<PathBuf>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            publish_quota: 3,
            broadcaster_ids: to_strings(DEFAULT_BROADCASTER_IDS),
            game_ids: to_strings(DEFAULT_GAME_IDS),
            language: "fr".to_string(),
            min_duration_secs: 15.0,
            max_duration_secs: 180.0,
            window_days: 1,
            clips_per_source: 50,
            data_dir: PathBuf::from("data"),
            history_file: PathBuf::from("published_shorts_history.json"),
            channel_name: "The Clips Moments".to_string(),
            history_retention_days: None,
            collaborator_timeout_secs: None,
            metrics_textfile: None,
        }
    }
}

impl PublisherConfig {
    pub fn filter_criteria(&self) -> FilterCriteria {
        FilterCriteria {
            language: self.language.clone(),
            min_duration_secs: self.min_duration_secs,
            max_duration_secs: self.max_duration_secs,
        }
    }

    pub fn history_path(&self) -> PathBuf {
        if self.history_file.is_absolute() {
            self.history_file.clone()
        } else {
            self.data_dir.join(&self.history_file)
        }
    }

    pub fn raw_clip_path(&self) -> PathBuf {
        self.data_dir.join(RAW_CLIP_FILE)
    }

    pub fn processed_clip_path(&self) -> PathBuf {
        self.data_dir.join(PROCESSED_CLIP_FILE)
    }

    /// Trim/dedup id lists and repair inconsistent bounds.
    pub fn sanitized(mut self) -> Self {
        self.broadcaster_ids = clean_list(self.broadcaster_ids);
        self.game_ids = clean_list(self.game_ids);
        self.language = self.language.trim().to_string();

        let defaults = Self::default();
        if !self.min_duration_secs.is_finite() || self.min_duration_secs < 0.0 {
            self.min_duration_secs = defaults.min_duration_secs;
        }
        if !self.max_duration_secs.is_finite() || self.max_duration_secs < 0.0 {
            self.max_duration_secs = defaults.max_duration_secs;
        }
        if self.min_duration_secs > self.max_duration_secs {
            std::mem::swap(&mut self.min_duration_secs, &mut self.max_duration_secs);
        }
        if self.clips_per_source == 0 {
            self.clips_per_source = defaults.clips_per_source;
        }
        self
    }
}

/// Load from an explicit path. Supports TOML or JSON.
pub fn load_config_from(path: &Path) -> Result<PublisherConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg: PublisherConfig = match ext.as_str() {
        "json" => serde_json::from_str(&content).context("parsing json config")?,
        _ => toml::from_str(&content).context("parsing toml config")?,
    };
    Ok(cfg.sanitized())
}

/// Load using env var + fallbacks:
/// 1) $PUBLISHER_CONFIG_PATH
/// 2) config/publisher.toml
/// 3) config/publisher.json
/// 4) built-in defaults
///
/// `$PUBLISH_QUOTA` overrides the quota from any of these.
pub fn load_config_default() -> Result<PublisherConfig> {
    let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        load_config_from(&pb)?
    } else if Path::new("config/publisher.toml").exists() {
        load_config_from(Path::new("config/publisher.toml"))?
    } else if Path::new("config/publisher.json").exists() {
        load_config_from(Path::new("config/publisher.json"))?
    } else {
        PublisherConfig::default()
    };

    if let Ok(q) = std::env::var(ENV_PUBLISH_QUOTA) {
        cfg.publish_quota = q
            .trim()
            .parse()
            .with_context(|| format!("{ENV_PUBLISH_QUOTA} is not a number: {q}"))?;
    }
    Ok(cfg)
}

/// Trimmed, non-empty, first occurrence kept.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

fn to_strings(ids: &[&str]) -> Vec<String> {
    clean_list(ids.iter().map(|s| s.to_string()).collect())
}

// Popular French-speaking channels.
const DEFAULT_BROADCASTER_IDS: &[&str] = &[
    "80716629",  // Inoxtag
    "737048563", // Anyme023
    "52130765",  // Squeezie
    "22245231",  // SqueezieLive
    "41719107",  // ZeratoR
    "24147592",  // Gotaga
    "134966333", // Kameto
    "496105401", // byilhann
    "887001013", // Nico_la
    "60256640",  // Flamby
    "253195796", // helydia
    "175560856", // Hctuan
    "57404419",  // Ponce
    "38038890",  // Antoine Daniel
    "48480373",  // MisterMV
    "19075728",  // Sardoche
    "54546583",  // Locklear
    "50290500",  // Domingo
    "57402636",  // RebeuDeter
    "47565457",  // Joyca
    "153066440", // Michou
    "41487980",  // Pauleta_Twitch
    "31429949",  // LeBouseuh
    "46296316",  // Maghla
    "49896798",  // Chowh1
    "49749557",  // Jiraya
    "53696803",  // Wankil Studio
    "72366922",  // Laink
    "129845722", // Terracid
    "51950294",  // Mynthos
    "53140510",  // Etoiles
    "134812328", // LittleBigWhale
    "180237751", // Mister V
    "55787682",  // Shaunz
    "142436402", // Ultia
    "20875990",  // LCK_France
];

const DEFAULT_GAME_IDS: &[&str] = &[
    "509670",     // Just Chatting
    "21779",      // League of Legends
    "32982",      // Grand Theft Auto V
    "512965",     // VALORANT
    "518018",     // Minecraft
    "513143",     // Fortnite
    "32399",      // Counter-Strike
    "511224",     // Apex Legends
    "506520",     // Dota 2
    "490422",     // Dead by Daylight
    "514873",     // Call of Duty: Warzone
    "65768",      // Rocket League
    "518883",     // EA Sports FC 24
    "180025139",  // Mario Kart 8 Deluxe
    "280721",     // Teamfight Tactics
    "488427",     // World of Warcraft
    "1467408070", // Rust
    "32213",      // Hearthstone
    "138585",     // Chess
    "493306",     // Overwatch 2
    "509660",     // Special Events
    "1063683693", // Pokemon Scarlet and Violet
    "1678120671", // Baldur's Gate 3
    "27471",      // osu!
    "507316",     // Phasmophobia
    "19326",      // The Elder Scrolls V: Skyrim
    "512710",     // Fall Guys
    "1285324545", // Lethal Company
];
