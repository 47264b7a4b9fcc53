// src/publish/mod.rs
//! Collaborators the run loop delegates to: download, render, authenticate,
//! upload. Each returns an explicit `Result`/outcome so the loop can branch
//! exhaustively without catching panics or inspecting error strings.

pub mod ffmpeg;
pub mod metadata;
pub mod youtube;
pub mod ytdlp;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::clip::ClipCandidate;
pub use metadata::{MetadataGenerator, VideoMetadata};

/// Authenticated handle for the publishing platform.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token_len", &self.access_token.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { video_id: String },
    /// The platform accepted the request but returned no id.
    NoVideoId,
}

#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `url` into `dest`; returns the path actually written.
    async fn download(&self, url: &str, dest: &Path) -> Result<PathBuf>;
}

#[async_trait::async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(
        &self,
        input: &Path,
        output: &Path,
        max_duration_secs: f64,
        clip: &ClipCandidate,
    ) -> Result<PathBuf>;
}

#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self) -> Result<Session>;
}

#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        session: &Session,
        file: &Path,
        metadata: &VideoMetadata,
    ) -> Result<PublishOutcome>;
}

/// Present and non-empty.
pub fn is_usable_artifact(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
