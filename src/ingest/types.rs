// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::clip::ClipCandidate;

/// Opaque bearer credential for the upstream clip platform.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessToken(len={})", self.0.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryTarget {
    Broadcaster(String),
    Game(String),
}

impl QueryTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryTarget::Broadcaster(_) => "broadcaster_id",
            QueryTarget::Game(_) => "game_id",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            QueryTarget::Broadcaster(id) | QueryTarget::Game(id) => id,
        }
    }
}

/// Broadcaster targets first, then categories.
pub fn targets_from(broadcaster_ids: &[String], game_ids: &[String]) -> Vec<QueryTarget> {
    broadcaster_ids
        .iter()
        .cloned()
        .map(QueryTarget::Broadcaster)
        .chain(game_ids.iter().cloned().map(QueryTarget::Game))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn trailing_days(now: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: now - Duration::days(i64::from(days)),
            end: now,
        }
    }
}

#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire(&self) -> Result<AccessToken>;
}

#[async_trait::async_trait]
pub trait SourceQuery: Send + Sync {
    async fn fetch(
        &self,
        token: &AccessToken,
        target: &QueryTarget,
        window: &TimeWindow,
        cap: u32,
    ) -> Result<Vec<ClipCandidate>>;
    fn name(&self) -> &'static str;
}
