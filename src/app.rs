// src/app.rs
//! Process wiring shared by the binaries: tracing setup and the live
//! (Twitch + yt-dlp + ffmpeg + YouTube) collaborator set.

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::ingest::providers::twitch::TwitchClient;
use crate::publish::ffmpeg::FfmpegShortRenderer;
use crate::publish::youtube::{YouTubeAuthenticator, YouTubePublisher};
use crate::publish::ytdlp::YtDlpDownloader;
use crate::runner::Collaborators;

/// Compact logs to stderr. `RUST_LOG` wins; default is `info`.
/// `LOG_FORMAT=json` switches to JSON lines for log shippers.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

pub fn live_collaborators() -> Result<Collaborators> {
    let twitch = Arc::new(TwitchClient::from_env()?);
    Ok(Collaborators {
        tokens: twitch.clone(),
        source: twitch,
        downloader: Arc::new(YtDlpDownloader::default()),
        transformer: Arc::new(FfmpegShortRenderer::default()),
        authenticator: Arc::new(YouTubeAuthenticator::from_env()?),
        publisher: Arc::new(YouTubePublisher::new()?),
    })
}
