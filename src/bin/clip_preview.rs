//! Dry run: select and rank today's candidates without downloading or
//! publishing anything. Handy for checking source lists and filters.

use anyhow::{anyhow, Result};
use chrono::Utc;
use clip_shorts_publisher::filter::EligibilityFilter;
use clip_shorts_publisher::history::{HistoryStore, JsonFileHistoryStore};
use clip_shorts_publisher::ingest::providers::twitch::TwitchClient;
use clip_shorts_publisher::ingest::select_candidates;
use clip_shorts_publisher::ingest::types::{targets_from, TimeWindow, TokenProvider};
use clip_shorts_publisher::{app, config};

const SHOW: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    app::init_tracing();

    let cfg = config::load_config_default()?;
    let now = Utc::now();
    let history = JsonFileHistoryStore::new(cfg.history_path()).load();
    let published = history.published_ids(now.date_naive());

    let twitch = TwitchClient::from_env()?;
    let token = twitch
        .acquire()
        .await
        .map_err(|e| anyhow!("could not get twitch token: {e:#}"))?;

    let targets = targets_from(&cfg.broadcaster_ids, &cfg.game_ids);
    let window = TimeWindow::trailing_days(now, cfg.window_days);
    let mut filter = EligibilityFilter::new(cfg.filter_criteria(), published);
    let (ranked, stats) = select_candidates(
        &twitch,
        &token,
        &targets,
        &window,
        cfg.clips_per_source,
        &mut filter,
    )
    .await;

    println!(
        "{} eligible clip(s) ({} fetched, {} rejected, {} duplicates, {} source errors)",
        ranked.len(),
        stats.fetched,
        stats.rejected,
        stats.duplicates,
        stats.source_errors
    );
    for (i, c) in ranked.iter().take(SHOW).enumerate() {
        println!(
            "{:>2}. {:>8} views  {:>5.1}s  {} - {} [{}]\n    {}",
            i + 1,
            c.view_count,
            c.duration_seconds,
            c.display_broadcaster(),
            c.display_title(),
            c.display_game(),
            c.source_url
        );
    }
    Ok(())
}
