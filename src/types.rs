//! Shared types passed between pipeline stages.
//!
//! A [`TrackedFile`] is what the scanner produces and what the tracker
//! records. An [`Edition`] is what the renderer consumes: it is built for one
//! run, handed to [`generate`](crate::generate), and dropped. Only its
//! effects (the HTML file and the updated processed set) outlive the run.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// A Markdown file observed under the content root.
///
/// Identity is `path`, relative to the content root with `/` separators so
/// the persisted state reads the same on every platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    pub path: String,
    pub modified: DateTime<Utc>,
}

impl TrackedFile {
    pub fn new(path: impl Into<String>, modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            modified,
        }
    }
}

/// Why a file made it into the delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Never published and absent from the previous scan.
    New,
    /// Never published, but already present in the previous scan.
    Pending,
    /// Published before; the file has changed since.
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::New => "new",
            ChangeKind::Pending => "pending",
            ChangeKind::Modified => "modified",
        };
        f.write_str(label)
    }
}

/// A candidate that passed the published-set check, with the reason it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaEntry {
    pub file: TrackedFile,
    pub change: ChangeKind,
}

/// What started a run. Scheduling itself happens outside the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Trigger {
    /// Weekly timer.
    Scheduled,
    /// Someone ran it by hand.
    #[default]
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Scheduled => f.write_str("scheduled"),
            Trigger::Manual => f.write_str("manual"),
        }
    }
}

/// Image shown on an item card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemImage {
    /// File in the portfolio assets directory, copied to `img/` on publish.
    Local { file_name: String, source: PathBuf },
    /// Absolute `http(s)` URL, referenced as-is.
    Remote(String),
}

impl ItemImage {
    /// The `src` attribute value, relative to the edition page.
    pub fn href(&self) -> String {
        match self {
            ItemImage::Local { file_name, .. } => format!("img/{file_name}"),
            ItemImage::Remote(url) => url.clone(),
        }
    }
}

/// One rendered entry of an edition.
#[derive(Debug, Clone)]
pub struct EditionItem {
    pub file: TrackedFile,
    pub change: ChangeKind,
    pub title: String,
    pub description: String,
    /// Plain-text excerpt for the summary card.
    pub excerpt: String,
    /// Markdown body, front matter stripped.
    pub body: String,
    pub tags: Vec<String>,
    pub url: Option<String>,
    /// Card and hero image.
    pub image: Option<ItemImage>,
    /// Local images referenced from the body, copied next to the page.
    pub inline_images: Vec<ItemImage>,
    /// Fragment id used by the table of contents.
    pub anchor: String,
}

/// The ordered items selected for one run, plus the date it is published under.
#[derive(Debug, Clone)]
pub struct Edition {
    pub published_at: DateTime<Utc>,
    pub items: Vec<EditionItem>,
}

impl Edition {
    /// `YYYYMMDD`, used in the edition file name.
    pub fn file_date(&self) -> String {
        self.published_at.format("%Y%m%d").to_string()
    }

    /// `DD/MM/YYYY`, used in page titles and the archive.
    pub fn display_date(&self) -> String {
        self.published_at.format("%d/%m/%Y").to_string()
    }

    /// File name of the edition page inside the newsletters directory.
    pub fn file_name(&self) -> String {
        format!("newsletter_{}.html", self.file_date())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
