// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::clip::ClipCandidate;
use crate::filter::{EligibilityFilter, Verdict};
use crate::ingest::types::{AccessToken, QueryTarget, SourceQuery, TimeWindow};
use crate::rank::rank_by_views;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up in the textfile dump).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_clips_total", "Clips returned by source queries.");
        describe_counter!("ingest_kept_total", "Clips kept after eligibility filtering.");
        describe_counter!(
            "ingest_rejected_total",
            "Clips dropped for language, duration or same-day history."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Clips dropped because an earlier source already returned them."
        );
        describe_counter!("ingest_source_errors_total", "Failed source queries.");
        describe_gauge!("ingest_candidates", "Ranked candidates in the last pass.");
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub fetched: usize,
    pub kept: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub source_errors: usize,
}

/// Query every target in order and push each source's clips through the
/// filter as they arrive. A failing target is logged and contributes nothing.
pub async fn collect_candidates(
    query: &dyn SourceQuery,
    token: &AccessToken,
    targets: &[QueryTarget],
    window: &TimeWindow,
    cap: u32,
    filter: &mut EligibilityFilter,
) -> (Vec<ClipCandidate>, IngestStats) {
    ensure_metrics_described();

    let mut kept = Vec::new();
    let mut stats = IngestStats::default();

    for target in targets {
        let clips = match query.fetch(token, target, window, cap).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    source = query.name(),
                    kind = target.kind(),
                    id = target.id(),
                    "source query failed, skipping"
                );
                counter!("ingest_source_errors_total").increment(1);
                stats.source_errors += 1;
                continue;
            }
        };
        if clips.is_empty() {
            tracing::debug!(kind = target.kind(), id = target.id(), "no clips in window");
        }

        stats.fetched += clips.len();
        for clip in clips {
            match filter.consider(&clip) {
                Verdict::Accepted => kept.push(clip),
                Verdict::Duplicate => stats.duplicates += 1,
                _ => stats.rejected += 1,
            }
        }
    }
    stats.kept = kept.len();

    counter!("ingest_clips_total").increment(stats.fetched as u64);
    counter!("ingest_kept_total").increment(stats.kept as u64);
    counter!("ingest_rejected_total").increment(stats.rejected as u64);
    counter!("ingest_dedup_total").increment(stats.duplicates as u64);

    (kept, stats)
}

/// Collect, filter and rank: the ordered list the run loop walks.
pub async fn select_candidates(
    query: &dyn SourceQuery,
    token: &AccessToken,
    targets: &[QueryTarget],
    window: &TimeWindow,
    cap: u32,
    filter: &mut EligibilityFilter,
) -> (Vec<ClipCandidate>, IngestStats) {
    let (mut clips, stats) = collect_candidates(query, token, targets, window, cap, filter).await;
    rank_by_views(&mut clips);
    gauge!("ingest_candidates").set(clips.len() as f64);

    tracing::info!(
        target: "ingest",
        fetched = stats.fetched,
        kept = stats.kept,
        rejected = stats.rejected,
        dedup = stats.duplicates,
        source_errors = stats.source_errors,
        "candidate selection done"
    );
    (clips, stats)
}
