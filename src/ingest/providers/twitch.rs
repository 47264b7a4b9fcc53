// src/ingest/providers/twitch.rs
//! Twitch Helix client: app access token + clip queries per broadcaster/game.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::clip::ClipCandidate;
use crate::ingest::types::{AccessToken, QueryTarget, SourceQuery, TimeWindow, TokenProvider};

const AUTH_URL: &str = "https://id.twitch.tv/oauth2/token";
const CLIPS_URL: &str = "https://api.twitch.tv/helix/clips";

/// Helix caps `first` at 100.
const MAX_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ClipsPage {
    #[serde(default)]
    data: Vec<RawClip>,
}

#[derive(Debug, Deserialize)]
struct RawClip {
    id: String,
    url: String,
    title: Option<String>,
    broadcaster_id: Option<String>,
    broadcaster_name: Option<String>,
    game_name: Option<String>,
    thumbnail_url: Option<String>,
    #[serde(default)]
    view_count: u64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    language: String,
    created_at: DateTime<Utc>,
}

impl From<RawClip> for ClipCandidate {
    fn from(r: RawClip) -> Self {
        ClipCandidate {
            id: r.id,
            source_url: r.url,
            title: r.title,
            broadcaster_id: r.broadcaster_id,
            broadcaster_name: r.broadcaster_name,
            game_name: r.game_name,
            thumbnail_url: r.thumbnail_url,
            view_count: r.view_count,
            duration_seconds: r.duration.max(0.0),
            language: r.language,
            created_at: r.created_at,
        }
    }
}

/// Parse one `/helix/clips` response body.
pub fn parse_clips_page(body: &str) -> Result<Vec<ClipCandidate>> {
    let page: ClipsPage = serde_json::from_str(body).context("parsing helix clips page")?;
    Ok(page.data.into_iter().map(ClipCandidate::from).collect())
}

fn rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub struct TwitchClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl TwitchClient {
    pub fn new(client_id: String, client_secret: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("clip-shorts-publisher/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .context("building twitch http client")?;
        Ok(Self {
            http,
            client_id,
            client_secret,
        })
    }

    /// Reads `TWITCH_CLIENT_ID` / `TWITCH_CLIENT_SECRET`.
    pub fn from_env() -> Result<Self> {
        let id = std::env::var("TWITCH_CLIENT_ID")
            .map_err(|_| anyhow!("Missing TWITCH_CLIENT_ID env var"))?;
        let secret = std::env::var("TWITCH_CLIENT_SECRET")
            .map_err(|_| anyhow!("Missing TWITCH_CLIENT_SECRET env var"))?;
        Self::new(id, secret)
    }
}

#[async_trait]
impl TokenProvider for TwitchClient {
    async fn acquire(&self) -> Result<AccessToken> {
        let resp = self
            .http
            .post(AUTH_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .context("twitch token request")?
            .error_for_status()
            .context("twitch token status")?;
        let body: TokenResponse = resp.json().await.context("twitch token body")?;
        if body.access_token.trim().is_empty() {
            return Err(anyhow!("twitch returned an empty access token"));
        }
        Ok(AccessToken(body.access_token))
    }
}

#[async_trait]
impl SourceQuery for TwitchClient {
    async fn fetch(
        &self,
        token: &AccessToken,
        target: &QueryTarget,
        window: &TimeWindow,
        cap: u32,
    ) -> Result<Vec<ClipCandidate>> {
        let first = cap.clamp(1, MAX_PAGE).to_string();
        let started_at = rfc3339(&window.start);
        let ended_at = rfc3339(&window.end);
        let query = [
            ("first", first.as_str()),
            ("started_at", started_at.as_str()),
            ("ended_at", ended_at.as_str()),
            (target.kind(), target.id()),
        ];

        let resp = self
            .http
            .get(CLIPS_URL)
            .header("Client-ID", &self.client_id)
            .bearer_auth(token.as_str())
            .query(&query)
            .send()
            .await
            .with_context(|| format!("helix clips {}={}", target.kind(), target.id()))?;

        let status = resp.status();
        let body = resp.text().await.context("helix clips .text()")?;
        if !status.is_success() {
            return Err(anyhow!("helix clips returned {status}: {body}"));
        }
        parse_clips_page(&body)
    }

    fn name(&self) -> &'static str {
        "twitch"
    }
}
