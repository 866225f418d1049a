//! Selection policy: window filter, ordering, and cap.
//!
//! Applied by the tracker to the files that are unpublished or changed. The
//! order is total (`modified` descending, then `path` ascending), so the same
//! inputs always select the same items in the same order.

use crate::config::SelectionConfig;
use crate::types::DeltaEntry;
use chrono::{DateTime, TimeDelta, Utc};

/// How many items an edition may hold and how old they may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub max_items: usize,
    /// Maximum age at run time. `None` accepts any age.
    pub window: Option<TimeDelta>,
}

impl SelectionPolicy {
    pub fn new(max_items: usize, window_days: u32) -> Self {
        Self {
            max_items,
            window: (window_days > 0).then(|| TimeDelta::days(i64::from(window_days))),
        }
    }

    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(config.max_items, config.window_days)
    }

    /// Whether a file modified at `modified` is young enough at `now`.
    ///
    /// Files stamped in the future are always inside the window.
    pub fn within_window(&self, modified: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.window {
            Some(window) => now.signed_duration_since(modified) <= window,
            None => true,
        }
    }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::from_config(&SelectionConfig::default())
    }
}

/// Outcome of applying a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub entries: Vec<DeltaEntry>,
    /// Entries older than the window.
    pub dropped_by_window: usize,
    /// Entries inside the window that did not fit under the cap.
    pub truncated: usize,
}

/// Filter by window, order newest first, and cap.
pub fn select(eligible: Vec<DeltaEntry>, policy: &SelectionPolicy, now: DateTime<Utc>) -> Selection {
    let before = eligible.len();
    let mut entries: Vec<DeltaEntry> = eligible
        .into_iter()
        .filter(|e| policy.within_window(e.file.modified, now))
        .collect();
    let dropped_by_window = before - entries.len();

    entries.sort_by(|a, b| {
        b.file
            .modified
            .cmp(&a.file.modified)
            .then_with(|| a.file.path.cmp(&b.file.path))
    });

    let truncated = entries.len().saturating_sub(policy.max_items);
    entries.truncate(policy.max_items);

    Selection {
        entries,
        dropped_by_window,
        truncated,
    }
}
