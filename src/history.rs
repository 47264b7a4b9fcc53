//! Per-day record of published clips, persisted as JSON.
//!
//! File shape: `{ "YYYY-MM-DD": [ {source_id, published_id, timestamp}, ... ] }`.
//! Unknown fields are ignored and the legacy key names `twitch_clip_id` /
//! `youtube_short_id` are still read. A missing or unparsable file loads as
//! empty history.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(alias = "twitch_clip_id")]
    pub source_id: String,
    #[serde(alias = "youtube_short_id")]
    pub published_id: String,
    /// RFC 3339 when written by us; older files may carry naive local stamps.
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublishHistory {
    days: BTreeMap<String, Vec<HistoryEntry>>,
}

pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl PublishHistory {
    pub fn entries_on(&self, date: NaiveDate) -> &[HistoryEntry] {
        self.days
            .get(&day_key(date))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn published_ids(&self, date: NaiveDate) -> HashSet<String> {
        self.entries_on(date)
            .iter()
            .map(|e| e.source_id.clone())
            .collect()
    }

    /// Returns false (and changes nothing) if `source_id` is already recorded for `date`.
    pub fn append(&mut self, date: NaiveDate, entry: HistoryEntry) -> bool {
        let bucket = self.days.entry(day_key(date)).or_default();
        if bucket.iter().any(|e| e.source_id == entry.source_id) {
            return false;
        }
        bucket.push(entry);
        true
    }

    /// Drop buckets strictly older than `keep_days` before `today`.
    /// Keys that are not valid dates are kept.
    pub fn prune_older_than(&mut self, today: NaiveDate, keep_days: u32) -> usize {
        let before = self.days.len();
        self.days.retain(|key, _| match NaiveDate::parse_from_str(key, "%Y-%m-%d") {
            Ok(d) => (today - d).num_days() <= i64::from(keep_days),
            Err(_) => {
                tracing::warn!(key = %key, "malformed date key in history, keeping it");
                true
            }
        });
        before - self.days.len()
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Persistence seam for the run loop. `load` never fails: unreadable state
/// is reported and treated as empty.
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> PublishHistory;
    fn save(&self, history: &PublishHistory) -> Result<()>;
}

/// JSON file written via `<file>.tmp` + rename.
#[derive(Debug, Clone)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<file>.corrupt`, where an unparseable history is kept for recovery.
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn load(&self) -> PublishHistory {
        let data = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return PublishHistory::default(),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "history unreadable, starting empty");
                return PublishHistory::default();
            }
        };
        match serde_json::from_str(&data) {
            Ok(h) => h,
            Err(e) => {
                let aside = self.corrupt_path();
                match fs::rename(&self.path, &aside) {
                    Ok(()) => tracing::warn!(
                        error = %e,
                        path = %self.path.display(),
                        moved_to = %aside.display(),
                        "history file corrupt, moved aside, starting empty"
                    ),
                    Err(mv) => tracing::warn!(
                        error = %e,
                        rename_error = %mv,
                        path = %self.path.display(),
                        "history file corrupt and could not be moved aside, starting empty"
                    ),
                }
                PublishHistory::default()
            }
        }
    }

    fn save(&self, history: &PublishHistory) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating history dir {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(history).context("serializing history")?;
        let tmp = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(json.as_bytes())?;
        f.sync_all()?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming history into {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    inner: Mutex<PublishHistory>,
    saves: Mutex<usize>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: PublishHistory) -> Self {
        Self {
            inner: Mutex::new(history),
            saves: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> PublishHistory {
        self.inner.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|g| *g).unwrap_or_default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> PublishHistory {
        self.snapshot()
    }

    fn save(&self, history: &PublishHistory) -> Result<()> {
        let mut g = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("history mutex poisoned"))?;
        *g = history.clone();
        if let Ok(mut n) = self.saves.lock() {
            *n += 1;
        }
        Ok(())
    }
}
