//! Clip shorts publisher: binary entrypoint.
//! Parameterless: everything comes from static config and the environment,
//! so it can be dropped into a scheduler as-is.

use std::sync::Arc;

use anyhow::Result;
use clip_shorts_publisher::{
    app, config, metrics::Metrics, JsonFileHistoryStore, RunController,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when the scheduler injects real env vars.
    let _ = dotenvy::dotenv();
    app::init_tracing();

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = ?e, "metrics recorder unavailable, continuing without");
            None
        }
    };

    let cfg = config::load_config_default()?;
    info!(
        quota = cfg.publish_quota,
        broadcasters = cfg.broadcaster_ids.len(),
        games = cfg.game_ids.len(),
        language = %cfg.language,
        "starting publish workflow"
    );

    let store = Arc::new(JsonFileHistoryStore::new(cfg.history_path()));
    let textfile = cfg.metrics_textfile.clone();
    let controller = RunController::new(cfg, app::live_collaborators()?, store);

    let summary = controller.run().await;
    info!(published = summary.published, end = ?summary.end, "workflow done");

    if let (Some(m), Some(path)) = (metrics.as_ref(), textfile.as_deref()) {
        if let Err(e) = m.write_textfile(path) {
            warn!(error = ?e, "could not write metrics textfile");
        }
    }
    Ok(())
}
