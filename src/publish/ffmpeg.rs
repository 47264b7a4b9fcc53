// src/publish/ffmpeg.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{is_usable_artifact, Transformer};
use crate::clip::ClipCandidate;

const TARGET_W: u32 = 1080;
const TARGET_H: u32 = 1920;

/// Trims to the duration bound and letterboxes into a 9:16 frame on black.
/// No title or streamer overlay, branded background or end card is drawn.
#[derive(Debug, Clone)]
pub struct FfmpegShortRenderer {
    program: String,
}

impl Default for FfmpegShortRenderer {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
        }
    }
}

fn vertical_filter() -> String {
    format!(
        "scale={TARGET_W}:{TARGET_H}:force_original_aspect_ratio=decrease,\
         pad={TARGET_W}:{TARGET_H}:(ow-iw)/2:(oh-ih)/2:black,setsar=1"
    )
}

#[async_trait]
impl Transformer for FfmpegShortRenderer {
    async fn transform(
        &self,
        input: &Path,
        output: &Path,
        max_duration_secs: f64,
        clip: &ClipCandidate,
    ) -> Result<PathBuf> {
        if !is_usable_artifact(input) {
            return Err(anyhow!("input {} missing or empty", input.display()));
        }
        if clip.duration_seconds > max_duration_secs {
            tracing::info!(
                clip = %clip.id,
                duration = clip.duration_seconds,
                max = max_duration_secs,
                "clip longer than bound, trimming"
            );
        }

        let duration = format!("{max_duration_secs:.3}");
        let filter = vertical_filter();
        let out = tokio::process::Command::new(&self.program)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-t", duration.as_str(), "-vf", filter.as_str()])
            .args(["-c:v", "libx264", "-preset", "veryfast", "-c:a", "aac"])
            .args(["-movflags", "+faststart"])
            .arg(output)
            .output()
            .await
            .with_context(|| format!("spawning {}", self.program))?;

        if !out.status.success() {
            return Err(anyhow!(
                "ffmpeg exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            ));
        }
        Ok(output.to_path_buf())
    }
}
