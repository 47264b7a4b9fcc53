// tests/selection_properties.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;

use clip_shorts_publisher::filter::{filter_all, EligibilityFilter, FilterCriteria};
use clip_shorts_publisher::ingest::select_candidates;
use clip_shorts_publisher::ingest::types::{
    targets_from, AccessToken, QueryTarget, SourceQuery, TimeWindow,
};
use clip_shorts_publisher::rank::rank_by_views;
use clip_shorts_publisher::ClipCandidate;

fn criteria() -> FilterCriteria {
    FilterCriteria {
        language: "fr".into(),
        min_duration_secs: 15.0,
        max_duration_secs: 180.0,
    }
}

/// Deterministic spread of languages, durations and views, with repeats.
fn synthetic(n: usize) -> Vec<ClipCandidate> {
    let langs = ["fr", "en", "fr", "de", "fr"];
    let durs = [5.0, 15.0, 42.5, 180.0, 181.0, 60.0, 0.0];
    (0..n)
        .map(|i| ClipCandidate {
            id: format!("c{}", i % (n / 2 + 1)),
            source_url: format!("https://clips.example/{i}"),
            title: None,
            broadcaster_id: None,
            broadcaster_name: None,
            game_name: None,
            thumbnail_url: None,
            view_count: ((i * 7919) % 1000) as u64,
            duration_seconds: durs[i % durs.len()],
            language: langs[i % langs.len()].into(),
            created_at: Utc::now(),
        })
        .collect()
}

#[test]
fn filtered_output_satisfies_every_predicate() {
    let published: Vec<String> = (0..10).map(|i| format!("c{i}")).collect();
    let out = filter_all(criteria(), published.clone(), synthetic(200));
    assert!(!out.is_empty());

    let published: HashSet<String> = published.into_iter().collect();
    let mut seen = HashSet::new();
    for c in &out {
        assert_eq!(c.language, "fr");
        assert!((15.0..=180.0).contains(&c.duration_seconds));
        assert!(!published.contains(&c.id));
        assert!(seen.insert(c.id.clone()), "duplicate id {}", c.id);
    }
}

#[test]
fn ranked_output_is_non_increasing_in_views() {
    let mut out = filter_all(criteria(), Vec::<String>::new(), synthetic(300));
    rank_by_views(&mut out);
    assert!(out.windows(2).all(|w| w[0].view_count >= w[1].view_count));
}

struct SplitSource {
    all: Vec<ClipCandidate>,
}

#[async_trait]
impl SourceQuery for SplitSource {
    async fn fetch(
        &self,
        _token: &AccessToken,
        target: &QueryTarget,
        _window: &TimeWindow,
        _cap: u32,
    ) -> Result<Vec<ClipCandidate>> {
        let idx: usize = target.id().parse()?;
        if idx == 2 {
            return Err(anyhow!("timeout talking to upstream"));
        }
        Ok(self.all.iter().skip(idx * 20).take(40).cloned().collect())
    }
    fn name(&self) -> &'static str {
        "split"
    }
}

#[tokio::test]
async fn per_source_filtering_matches_single_pass_over_surviving_sources() {
    let all = synthetic(120);
    let src = SplitSource { all: all.clone() };
    let ids: Vec<String> = (0..5).map(|i| i.to_string()).collect();
    let targets = targets_from(&ids, &[]);
    let window = TimeWindow::trailing_days(Utc::now(), 1);
    let token = AccessToken("t".into());

    let mut f = EligibilityFilter::new(criteria(), ["c3"]);
    let (ranked, stats) = select_candidates(&src, &token, &targets, &window, 40, &mut f).await;
    assert_eq!(stats.source_errors, 1);

    // union of the healthy sources, filtered in one pass
    let union: Vec<ClipCandidate> = [0usize, 1, 3, 4]
        .iter()
        .flat_map(|i| all.iter().skip(i * 20).take(40).cloned())
        .collect();
    let mut expected = filter_all(criteria(), ["c3"], union);
    rank_by_views(&mut expected);

    let got: HashSet<&str> = ranked.iter().map(|c| c.id.as_str()).collect();
    let want: HashSet<&str> = expected.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(got, want);
    assert!(!got.is_empty());
}
