// src/publish/youtube.rs
//! YouTube Data API v3: refresh-token auth + resumable upload.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::LOCATION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Authenticator, PublishOutcome, Publisher, Session, VideoMetadata};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("clip-shorts-publisher/0.1")
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()
        .context("building youtube http client")
}

/// Google "authorized user" credential file, as written by the installed-app flow.
#[derive(Debug, Deserialize)]
struct AuthorizedUser {
    client_id: String,
    client_secret: String,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: Option<String>,
}

pub struct YouTubeAuthenticator {
    http: reqwest::Client,
    token_file: PathBuf,
}

impl YouTubeAuthenticator {
    pub fn new(token_file: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_secs(20))?,
            token_file: token_file.into(),
        })
    }

    /// `$YOUTUBE_TOKEN_FILE`, else `token.json`.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var("YOUTUBE_TOKEN_FILE").unwrap_or_else(|_| "token.json".into());
        Self::new(path)
    }
}

#[async_trait]
impl Authenticator for YouTubeAuthenticator {
    async fn authenticate(&self) -> Result<Session> {
        let raw = tokio::fs::read_to_string(&self.token_file)
            .await
            .with_context(|| format!("reading {}", self.token_file.display()))?;
        let creds: AuthorizedUser =
            serde_json::from_str(&raw).context("parsing youtube token file")?;
        let refresh = creds
            .refresh_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("token file has no refresh_token; run the consent flow once"))?;

        let resp: RefreshResponse = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("refresh_token", refresh.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("google token refresh")?
            .error_for_status()
            .context("google token refresh status")?
            .json()
            .await
            .context("google token refresh body")?;

        match resp.access_token.filter(|t| !t.is_empty()) {
            Some(access_token) => Ok(Session { access_token }),
            None => Err(anyhow!("google token refresh returned no access_token")),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Snippet<'a> {
    title: &'a str,
    description: &'a str,
    tags: &'a [String],
    category_id: &'a str,
    default_language: &'a str,
    default_audio_language: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    privacy_status: &'a str,
    embeddable: bool,
    license: &'a str,
    self_declared_made_for_kids: bool,
}

#[derive(Debug, Serialize)]
struct VideoResource<'a> {
    snippet: Snippet<'a>,
    status: Status<'a>,
}

fn video_resource(m: &VideoMetadata) -> VideoResource<'_> {
    VideoResource {
        snippet: Snippet {
            title: &m.title,
            description: &m.description,
            tags: &m.tags,
            category_id: &m.category_id,
            default_language: &m.default_language,
            default_audio_language: &m.default_language,
        },
        status: Status {
            privacy_status: &m.privacy_status,
            embeddable: m.embeddable,
            license: &m.license,
            self_declared_made_for_kids: m.made_for_kids,
        },
    }
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: Option<String>,
}

pub struct YouTubePublisher {
    http: reqwest::Client,
}

impl YouTubePublisher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_secs(600))?,
        })
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    async fn publish(
        &self,
        session: &Session,
        file: &Path,
        metadata: &VideoMetadata,
    ) -> Result<PublishOutcome> {
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;

        // 1) open resumable session
        let init = self
            .http
            .post(UPLOAD_URL)
            .bearer_auth(&session.access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", bytes.len().to_string())
            .json(&video_resource(metadata))
            .send()
            .await
            .context("youtube upload init")?
            .error_for_status()
            .context("youtube upload init status")?;
        let location = init
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("youtube upload init returned no Location"))?
            .to_string();

        // 2) single-shot body upload
        tracing::info!(bytes = bytes.len(), "uploading video body");
        let resp: InsertResponse = self
            .http
            .put(&location)
            .bearer_auth(&session.access_token)
            .header("Content-Type", "video/mp4")
            .body(bytes)
            .send()
            .await
            .context("youtube upload body")?
            .error_for_status()
            .context("youtube upload body status")?
            .json()
            .await
            .context("youtube upload response")?;

        Ok(match resp.id.filter(|id| !id.is_empty()) {
            Some(video_id) => PublishOutcome::Published { video_id },
            None => PublishOutcome::NoVideoId,
        })
    }
}
