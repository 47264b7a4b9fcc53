// src/filter.rs
//! Eligibility predicates: language, duration window, cross-run history and
//! intra-pass dedup. The filter is stateful so it can be applied per source
//! while collecting; the result equals one pass over the full union.

use std::collections::HashSet;

use crate::clip::ClipCandidate;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub language: String,
    pub min_duration_secs: f64,
    pub max_duration_secs: f64,
}

impl FilterCriteria {
    pub fn duration_ok(&self, secs: f64) -> bool {
        self.min_duration_secs <= secs && secs <= self.max_duration_secs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    WrongLanguage,
    OutOfDuration,
    AlreadyPublished,
    /// Already accepted earlier in this pass (overlapping source queries).
    Duplicate,
}

#[derive(Debug)]
pub struct EligibilityFilter {
    criteria: FilterCriteria,
    published: HashSet<String>,
    accepted: HashSet<String>,
}

impl EligibilityFilter {
    pub fn new<I, S>(criteria: FilterCriteria, already_published: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            criteria,
            published: already_published.into_iter().map(Into::into).collect(),
            accepted: HashSet::new(),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Classify one clip. An `Accepted` verdict marks the id as seen, so later
    /// copies of the same clip come back as `Duplicate`.
    pub fn consider(&mut self, clip: &ClipCandidate) -> Verdict {
        if self.published.contains(&clip.id) {
            return Verdict::AlreadyPublished;
        }
        if self.accepted.contains(&clip.id) {
            return Verdict::Duplicate;
        }
        if clip.language != self.criteria.language {
            return Verdict::WrongLanguage;
        }
        if !self.criteria.duration_ok(clip.duration_seconds) {
            return Verdict::OutOfDuration;
        }
        self.accepted.insert(clip.id.clone());
        Verdict::Accepted
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }
}

/// Single combined pass over an already-merged list.
pub fn filter_all<I, S>(
    criteria: FilterCriteria,
    already_published: I,
    items: Vec<ClipCandidate>,
) -> Vec<ClipCandidate>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut f = EligibilityFilter::new(criteria, already_published);
    items
        .into_iter()
        .filter(|c| f.consider(c) == Verdict::Accepted)
        .collect()
}
