// src/runner.rs
//! One unattended run: load history, get a token, select ranked candidates,
//! then walk them until the publish quota is met or the list runs out.
//!
//! Per-candidate failures never leave this module as errors. The only
//! externally visible signal is the returned [`RunSummary`] (and the logs).

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::clip::ClipCandidate;
use crate::config::PublisherConfig;
use crate::filter::EligibilityFilter;
use crate::history::{HistoryEntry, HistoryStore, PublishHistory};
use crate::ingest::select_candidates;
use crate::ingest::types::{targets_from, SourceQuery, TimeWindow, TokenProvider};
use crate::publish::{
    is_usable_artifact, Authenticator, Downloader, MetadataGenerator, PublishOutcome, Publisher,
    Transformer,
};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("publish_attempts_total", "Candidates the run loop started work on.");
        describe_counter!("publish_success_total", "Clips published and recorded in history.");
        describe_counter!("publish_failures_total", "Per-candidate failures, labelled by stage.");
        describe_gauge!("run_published", "Clips published by the last run.");
        describe_gauge!("run_last_ts", "Unix ts when the last run finished.");
    });
}

/// External steps, used for timeouts, logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Token,
    Download,
    Transform,
    Authenticate,
    Publish,
    HistoryCommit,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Token => "token",
            Stage::Download => "download",
            Stage::Transform => "transform",
            Stage::Authenticate => "authenticate",
            Stage::Publish => "publish",
            Stage::HistoryCommit => "history_commit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Published { video_id: String },
    /// Already attempted this run or already published today.
    Skipped,
    DownloadFailed,
    /// Neither the rendered nor the raw file was usable.
    TransformUnusable,
    AuthFailed,
    /// Upload raised or returned no id.
    PublishFailed,
    /// Uploaded, but the history file could not be written.
    PublishedButNotRecorded { video_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    NoAccessToken,
    NoCandidates,
    QuotaReached,
    CandidatesExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Uploads that returned a video id, whether or not history was saved.
    pub published: usize,
    pub attempted: usize,
    pub candidates: usize,
    pub end: RunEnd,
    pub outcomes: Vec<(String, ItemOutcome)>,
}

impl RunSummary {
    fn ended(end: RunEnd) -> Self {
        Self {
            published: 0,
            attempted: 0,
            candidates: 0,
            end,
            outcomes: Vec::new(),
        }
    }

    pub fn published_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| {
                matches!(
                    o,
                    ItemOutcome::Published { .. } | ItemOutcome::PublishedButNotRecorded { .. }
                )
            })
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// The external steps the run loop drives.
#[derive(Clone)]
pub struct Collaborators {
    pub tokens: Arc<dyn TokenProvider>,
    pub source: Arc<dyn SourceQuery>,
    pub downloader: Arc<dyn Downloader>,
    pub transformer: Arc<dyn Transformer>,
    pub authenticator: Arc<dyn Authenticator>,
    pub publisher: Arc<dyn Publisher>,
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct RunController {
    config: PublisherConfig,
    collab: Collaborators,
    store: Arc<dyn HistoryStore>,
    metadata: MetadataGenerator,
    clock: Clock,
}

impl RunController {
    pub fn new(
        config: PublisherConfig,
        collab: Collaborators,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        let metadata = MetadataGenerator::new(config.channel_name.clone(), config.language.clone());
        Self {
            config,
            collab,
            store,
            metadata,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    pub async fn run(&self) -> RunSummary {
        ensure_metrics_described();
        let summary = self.run_inner().await;

        gauge!("run_published").set(summary.published as f64);
        gauge!("run_last_ts").set((self.clock)().timestamp().max(0) as f64);
        if summary.published == 0 && self.config.publish_quota > 0 {
            info!(end = ?summary.end, "no clip could be published this run");
        } else {
            info!(
                published = summary.published,
                attempted = summary.attempted,
                end = ?summary.end,
                "run finished"
            );
        }
        summary
    }

    async fn run_inner(&self) -> RunSummary {
        let started = (self.clock)();
        let today = started.date_naive();

        // 1) history
        let mut history = self.load_history(today);
        let published_today = history.published_ids(today);

        // 2) upstream credential
        let token = match self.bounded(Stage::Token, self.collab.tokens.acquire()).await {
            Ok(t) => t,
            Err(e) => {
                error!(error = ?e, "could not acquire source access token, ending run");
                return RunSummary::ended(RunEnd::NoAccessToken);
            }
        };

        // 3) aggregate + filter + rank, seeded with today's history
        let targets = targets_from(&self.config.broadcaster_ids, &self.config.game_ids);
        let window = TimeWindow::trailing_days(started, self.config.window_days);
        let mut filter =
            EligibilityFilter::new(self.config.filter_criteria(), published_today.iter().cloned());
        let (ranked, _stats) = select_candidates(
            self.collab.source.as_ref(),
            &token,
            &targets,
            &window,
            self.config.clips_per_source,
            &mut filter,
        )
        .await;

        // 4) nothing to do
        if ranked.is_empty() {
            info!("no new eligible clip found");
            return RunSummary::ended(RunEnd::NoCandidates);
        }

        // 5..13) bounded publish loop
        self.publish_loop(&ranked, today, &mut history).await
    }

    /// Walks an already ranked list against today's history, as the tail of
    /// [`run`](Self::run) does. Repeated ids in `ranked` are attempted once.
    pub async fn publish_ranked(&self, ranked: &[ClipCandidate]) -> RunSummary {
        ensure_metrics_described();
        let today = (self.clock)().date_naive();
        let mut history = self.load_history(today);
        if ranked.is_empty() {
            return RunSummary::ended(RunEnd::NoCandidates);
        }
        self.publish_loop(ranked, today, &mut history).await
    }

    fn load_history(&self, today: NaiveDate) -> PublishHistory {
        let mut history = self.store.load();
        if let Some(keep) = self.config.history_retention_days {
            let removed = history.prune_older_than(today, keep);
            if removed > 0 {
                info!(removed, keep_days = keep, "pruned old history days");
            }
        }
        info!(
            already_published = history.entries_on(today).len(),
            day = %today,
            "history loaded"
        );
        history
    }

    async fn publish_loop(
        &self,
        ranked: &[ClipCandidate],
        today: NaiveDate,
        history: &mut PublishHistory,
    ) -> RunSummary {
        let quota = self.config.publish_quota;
        let mut summary = RunSummary::ended(RunEnd::CandidatesExhausted);
        summary.candidates = ranked.len();
        let mut published_today = history.published_ids(today);
        let mut attempted: HashSet<String> = HashSet::new();

        for clip in ranked {
            if summary.published >= quota {
                info!(quota, "publish quota reached");
                summary.end = RunEnd::QuotaReached;
                break;
            }
            if attempted.contains(&clip.id) || published_today.contains(&clip.id) {
                debug!(clip = %clip.id, "already attempted or published today, skipping");
                summary.outcomes.push((clip.id.clone(), ItemOutcome::Skipped));
                continue;
            }
            attempted.insert(clip.id.clone());
            summary.attempted += 1;
            counter!("publish_attempts_total").increment(1);

            let outcome = self.process(clip, today, history).await;
            match &outcome {
                ItemOutcome::Published { .. } => {
                    published_today = history.published_ids(today);
                    summary.published += 1;
                    counter!("publish_success_total").increment(1);
                }
                // live upload, counts toward the quota without a record
                ItemOutcome::PublishedButNotRecorded { .. } => {
                    published_today = history.published_ids(today);
                    summary.published += 1;
                }
                _ => {}
            }
            summary.outcomes.push((clip.id.clone(), outcome));
        }
        if summary.end == RunEnd::CandidatesExhausted && summary.published >= quota {
            summary.end = RunEnd::QuotaReached;
        }
        summary
    }

    /// Runs one candidate end to end. The raw download is removed afterwards
    /// whatever happened; the rendered file stays as the run's artifact.
    async fn process(
        &self,
        clip: &ClipCandidate,
        today: NaiveDate,
        history: &mut PublishHistory,
    ) -> ItemOutcome {
        info!(
            clip = %clip.id,
            title = clip.display_title(),
            broadcaster = clip.display_broadcaster(),
            views = clip.view_count,
            "attempting clip"
        );
        let raw = self.config.raw_clip_path();
        let outcome = self.process_inner(clip, today, history, &raw).await;
        remove_if_exists(&raw);
        outcome
    }

    async fn process_inner(
        &self,
        clip: &ClipCandidate,
        today: NaiveDate,
        history: &mut PublishHistory,
        raw: &Path,
    ) -> ItemOutcome {
        // download
        let downloaded = match self
            .bounded(Stage::Download, self.collab.downloader.download(&clip.source_url, raw))
            .await
        {
            Ok(p) if is_usable_artifact(&p) => p,
            Ok(p) => {
                let err = anyhow!("downloaded file {} missing or empty", p.display());
                return self.fail(clip, Stage::Download, ItemOutcome::DownloadFailed, &err);
            }
            Err(e) => return self.fail(clip, Stage::Download, ItemOutcome::DownloadFailed, &e),
        };

        // render, falling back to the raw file
        let processed = self.config.processed_clip_path();
        let rendered = self
            .bounded(
                Stage::Transform,
                self.collab.transformer.transform(
                    &downloaded,
                    &processed,
                    self.config.max_duration_secs,
                    clip,
                ),
            )
            .await;
        let upload_file: PathBuf = match rendered {
            Ok(p) if is_usable_artifact(&p) => p,
            other => {
                if let Err(e) = &other {
                    warn!(clip = %clip.id, error = ?e, "render failed");
                } else {
                    warn!(clip = %clip.id, "rendered file missing or empty");
                }
                if is_usable_artifact(&downloaded) {
                    info!(clip = %clip.id, "falling back to the raw download");
                    downloaded.clone()
                } else {
                    remove_if_exists(&processed);
                    return self.fail(
                        clip,
                        Stage::Transform,
                        ItemOutcome::TransformUnusable,
                        &anyhow!("neither rendered nor raw file is usable"),
                    );
                }
            }
        };

        let metadata = self.metadata.build(clip, today);
        debug!(
            clip = %clip.id,
            title = %metadata.title,
            tags = %metadata.tags.join(", "),
            file = %upload_file.display(),
            "metadata ready"
        );

        // authenticate
        let session = match self
            .bounded(Stage::Authenticate, self.collab.authenticator.authenticate())
            .await
        {
            Ok(s) => s,
            Err(e) => return self.fail(clip, Stage::Authenticate, ItemOutcome::AuthFailed, &e),
        };

        // upload
        let video_id = match self
            .bounded(
                Stage::Publish,
                self.collab.publisher.publish(&session, &upload_file, &metadata),
            )
            .await
        {
            Ok(PublishOutcome::Published { video_id }) => video_id,
            Ok(PublishOutcome::NoVideoId) => {
                return self.fail(
                    clip,
                    Stage::Publish,
                    ItemOutcome::PublishFailed,
                    &anyhow!("upload returned no video id"),
                );
            }
            Err(e) => return self.fail(clip, Stage::Publish, ItemOutcome::PublishFailed, &e),
        };
        info!(clip = %clip.id, video_id = %video_id, "published");

        // commit
        let entry = HistoryEntry {
            source_id: clip.id.clone(),
            published_id: video_id.clone(),
            timestamp: (self.clock)().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        if !history.append(today, entry) {
            debug!(clip = %clip.id, "already in today's history");
        }
        match self.store.save(history) {
            Ok(()) => ItemOutcome::Published { video_id },
            Err(e) => self.fail(
                clip,
                Stage::HistoryCommit,
                ItemOutcome::PublishedButNotRecorded { video_id },
                &e,
            ),
        }
    }

    fn fail(
        &self,
        clip: &ClipCandidate,
        stage: Stage,
        outcome: ItemOutcome,
        err: &anyhow::Error,
    ) -> ItemOutcome {
        warn!(clip = %clip.id, stage = %stage, error = ?err, "candidate failed, moving on");
        counter!("publish_failures_total", "stage" => stage.as_str()).increment(1);
        outcome
    }

    async fn bounded<T>(&self, stage: Stage, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.config.collaborator_timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), fut)
                .await
                .map_err(|_| anyhow!("{stage} timed out after {secs}s"))?,
            None => fut.await,
        }
    }
}

fn remove_if_exists(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed temp file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove temp file"),
    }
}
