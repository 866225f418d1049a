//! One newsletter run, end to end.
//!
//! ```text
//! load state ─► scan ─► compute delta ─► load items ─► render ─► publish ─► commit ─► notify
//!   (fatal)    (fatal)      (pure)        (skip bad)    (pure)    (fatal)   (fatal)  (logged)
//! ```
//!
//! State is read before anything is written, so a corrupt state directory
//! aborts the run with the publish directory untouched. The commit runs only
//! after every publish write succeeded; any earlier failure leaves the state
//! files byte-identical. Notification comes last and cannot fail the run.

use crate::config::{self, ConfigError, NewsletterConfig};
use crate::generate::{self, GenerateError};
use crate::metadata::{self, AssetIndex};
use crate::notify::{self, Notifier};
use crate::publish::{self, PublishError};
use crate::scan::{self, ScanError};
use crate::select::SelectionPolicy;
use crate::tracker::{Delta, DeltaStats, StateError, StateStore, Tracker};
use crate::types::{Edition, EditionItem, TrackedFile, Trigger};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("scan: {0}")]
    Scan(#[from] ScanError),
    #[error("state: {0}")]
    State(#[from] StateError),
    #[error("render: {0}")]
    Generate(#[from] GenerateError),
    #[error("publish: {0}")]
    Publish(#[from] PublishError),
}

/// Where a run reads and writes, plus the resolved configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Root of the portfolio checkout.
    pub portfolio: PathBuf,
    /// Publish directory.
    pub output: PathBuf,
    pub state_dir: PathBuf,
    pub config: NewsletterConfig,
}

/// Command-line replacements for `[selection]` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionOverrides {
    pub max_items: Option<usize>,
    pub window_days: Option<u32>,
}

impl Workspace {
    pub fn new(
        portfolio: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        state_dir: impl Into<PathBuf>,
        config: NewsletterConfig,
    ) -> Self {
        Self {
            portfolio: portfolio.into(),
            output: output.into(),
            state_dir: state_dir.into(),
            config,
        }
    }

    /// Build a workspace, reading configuration from `config_path`.
    pub fn load(
        portfolio: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        state_dir: impl Into<PathBuf>,
        config_path: &Path,
    ) -> Result<Self, RunError> {
        let config = config::load_config(config_path)?;
        Ok(Self::new(portfolio, output, state_dir, config))
    }

    /// Apply overrides and re-validate.
    pub fn with_overrides(mut self, overrides: SelectionOverrides) -> Result<Self, RunError> {
        if let Some(max_items) = overrides.max_items {
            self.config.selection.max_items = max_items;
        }
        if let Some(window_days) = overrides.window_days {
            self.config.selection.window_days = window_days;
        }
        self.config.validate()?;
        Ok(self)
    }

    pub fn content_root(&self) -> PathBuf {
        self.portfolio.join(&self.config.content_dir)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.portfolio.join(&self.config.assets_dir)
    }

    pub fn store(&self) -> StateStore {
        StateStore::new(&self.state_dir)
    }

    pub fn policy(&self) -> SelectionPolicy {
        SelectionPolicy::from_config(&self.config.selection)
    }
}

// =============================================================================
// Preview
// =============================================================================

/// What a run would select right now, without writing anything.
#[derive(Debug, Clone)]
pub struct Preview {
    pub candidates: Vec<TrackedFile>,
    pub delta: Delta,
}

pub fn preview(workspace: &Workspace, now: DateTime<Utc>) -> Result<Preview, RunError> {
    let tracker = workspace.store().load()?;
    let candidates = scan::scan(&workspace.content_root())?;
    let delta = tracker.compute_delta(&candidates, &workspace.policy(), now);
    Ok(Preview { candidates, delta })
}

// =============================================================================
// Run
// =============================================================================

/// A file selected for the edition that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// No notifier was supplied.
    Disabled,
    /// `site.public_url` is not set, so there is nothing to link to.
    NoPublicUrl,
    Sent { url: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published {
        edition_path: PathBuf,
        /// Titles in edition order.
        titles: Vec<String>,
        images_copied: usize,
        archived: usize,
        notification: Notification,
    },
    /// Nothing eligible, or nothing eligible could be loaded.
    NothingToPublish,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub trigger: Trigger,
    pub now: DateTime<Utc>,
    pub stats: DeltaStats,
    pub skipped: Vec<SkippedItem>,
    pub outcome: RunOutcome,
}

/// Produce, publish and record one edition.
pub fn run(
    workspace: &Workspace,
    trigger: Trigger,
    now: DateTime<Utc>,
    notifier: Option<&dyn Notifier>,
) -> Result<RunReport, RunError> {
    let config = &workspace.config;
    tracing::info!(trigger = %trigger, "starting newsletter run");

    let store = workspace.store();
    let tracker = store.load()?;
    let candidates = scan::scan(&workspace.content_root())?;
    let delta = tracker.compute_delta(&candidates, &workspace.policy(), now);
    tracing::info!(stats = %delta.stats, selected = delta.entries.len(), "computed delta");

    let assets = AssetIndex::load(&workspace.assets_dir());
    let (items, skipped) = load_items(&delta, &workspace.content_root(), &assets, config);

    let mut report = RunReport {
        trigger,
        now,
        stats: delta.stats.clone(),
        skipped,
        outcome: RunOutcome::NothingToPublish,
    };
    if items.is_empty() {
        tracing::info!("nothing to publish");
        return Ok(report);
    }

    let edition = Edition {
        published_at: now,
        items,
    };
    let header_image = match config.site.header_image() {
        Some(name) => {
            let found = assets.resolve_reference(name);
            if found.is_none() {
                tracing::warn!(image = %name, "header image not found in assets");
            }
            found
        }
        None => None,
    };

    let rendered = generate::render_edition(
        &edition,
        config,
        header_image.as_ref().map(|image| image.href()),
    )?;
    let published = publish::publish(
        &edition,
        &rendered,
        header_image.as_ref(),
        &workspace.output,
        config,
    )?;

    let published_files: Vec<TrackedFile> =
        edition.items.iter().map(|item| item.file.clone()).collect();
    store.save(&tracker.commit(&published_files, &candidates, now))?;
    tracing::info!(items = published_files.len(), "state committed");

    let notification = announce(&edition, &rendered.file_name, config, notifier);

    report.outcome = RunOutcome::Published {
        edition_path: published.edition_path,
        titles: edition.items.iter().map(|item| item.title.clone()).collect(),
        images_copied: published.images_copied,
        archived: published.archived,
        notification,
    };
    Ok(report)
}

/// Load every delta entry, setting aside the ones that fail.
fn load_items(
    delta: &Delta,
    content_root: &Path,
    assets: &AssetIndex,
    config: &NewsletterConfig,
) -> (Vec<EditionItem>, Vec<SkippedItem>) {
    let mut items: Vec<EditionItem> = Vec::new();
    let mut skipped = Vec::new();
    let mut anchors: HashSet<String> = HashSet::new();

    for entry in &delta.entries {
        match metadata::load_item(entry, content_root, assets, &config.content) {
            Ok(mut item) => {
                item.anchor = unique_anchor(&item.anchor, &anchors);
                anchors.insert(item.anchor.clone());
                items.push(item);
            }
            Err(e) => {
                tracing::warn!(path = %entry.file.path, error = %e, "skipping file");
                skipped.push(SkippedItem {
                    path: entry.file.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    (items, skipped)
}

/// `anchor`, or `anchor-2`, `anchor-3`, ... when already taken.
fn unique_anchor(anchor: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(anchor) {
        return anchor.to_string();
    }
    (2..)
        .map(|n| format!("{anchor}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| anchor.to_string())
}

fn announce(
    edition: &Edition,
    file_name: &str,
    config: &NewsletterConfig,
    notifier: Option<&dyn Notifier>,
) -> Notification {
    let Some(notifier) = notifier else {
        return Notification::Disabled;
    };
    let Some(url) = config.site.edition_url(file_name) else {
        tracing::warn!("site.public_url is not set, skipping notification");
        return Notification::NoPublicUrl;
    };
    let summary = notify::compose_summary(edition, &config.site.title, &url, &config.notify);
    match notifier.notify(&url, &summary) {
        Ok(()) => Notification::Sent { url },
        Err(e) => {
            tracing::warn!(error = %e, "notification failed");
            Notification::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Load tracking state for display.
pub fn load_state(workspace: &Workspace) -> Result<Tracker, RunError> {
    Ok(workspace.store().load()?)
}
