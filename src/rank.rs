// src/rank.rs
use crate::clip::ClipCandidate;

/// Most viewed first. `sort_by` is stable, so equal view counts keep their
/// collection order (which itself depends on source iteration order).
pub fn rank_by_views(clips: &mut [ClipCandidate]) {
    clips.sort_by(|a, b| b.view_count.cmp(&a.view_count));
}
