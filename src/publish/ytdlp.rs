// src/publish/ytdlp.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{is_usable_artifact, Downloader};

const FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Downloads clips by spawning `yt-dlp`.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    program: String,
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
        }
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        if let Some(dir) = dest.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }

        let output = tokio::process::Command::new(&self.program)
            .args(["-f", FORMAT, "--no-progress", "--force-overwrites", "--output"])
            .arg(dest)
            .arg(url)
            .output()
            .await
            .with_context(|| format!("spawning {}", self.program))?;

        tracing::debug!(stdout = %String::from_utf8_lossy(&output.stdout), "yt-dlp output");
        if !output.status.success() {
            return Err(anyhow!(
                "yt-dlp exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        if !is_usable_artifact(dest) {
            return Err(anyhow!("yt-dlp reported success but {} is empty", dest.display()));
        }
        Ok(dest.to_path_buf())
    }
}
