//! Filesystem scanning for candidate documents.
//!
//! Stage 1 of the newsletter pipeline. Walks the content directory of the
//! portfolio and lists every Markdown document with its modification time.
//! The scanner has no opinion on what is new: it reports what exists, and the
//! [`tracker`](crate::tracker) decides what goes into the edition.
//!
//! ## Directory Structure
//!
//! ```text
//! portfolio/
//! ├── docs/                        # Content root (config: content_dir)
//! │   ├── slowsia.md               # Candidate "slowsia.md"
//! │   ├── data-viz.markdown        # Candidate "data-viz.markdown"
//! │   ├── .drafts/                 # Hidden: skipped
//! │   │   └── wip.md
//! │   └── 2024/
//! │       └── retro.md             # Candidate "2024/retro.md"
//! └── img/                         # Assets (config: assets_dir)
//! ```
//!
//! ## Rules
//!
//! - Extensions `.md` and `.markdown` match case-insensitively
//! - Entries whose name starts with `.` are skipped, directories included
//! - Paths are relative to the content root with `/` separators
//! - Results are sorted by path
//!
//! An unreadable content root is fatal. An unreadable entry below it is
//! logged and skipped, as is a path containing a tab or newline, which the
//! line-oriented state files cannot hold.

use crate::types::TrackedFile;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read content directory {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("content path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// List every Markdown document under `root`, sorted by relative path.
pub fn scan(root: &Path) -> Result<Vec<TrackedFile>, ScanError> {
    let root_meta = std::fs::metadata(root).map_err(|source| ScanError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    if !root_meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    // Metadata can succeed on a directory we are not allowed to list.
    std::fs::read_dir(root).map_err(|source| ScanError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                tracing::warn!(path = %path, error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        let Some(rel) = relative_path(root, entry.path()) else {
            continue;
        };
        if rel.contains(['\t', '\n', '\r']) {
            tracing::warn!(path = %rel.escape_debug(), "skipping path with tab or newline");
            continue;
        }
        match std::fs::metadata(entry.path()).and_then(|m| m.modified()) {
            Ok(modified) => files.push(TrackedFile::new(rel, DateTime::<Utc>::from(modified))),
            Err(e) => {
                tracing::warn!(path = %rel, error = %e, "skipping file without modification time");
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::info!(root = %root.display(), count = files.len(), "scanned content directory");
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|ext| e.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// `/`-separated path of `path` relative to `root`, or `None` when it is not
/// valid UTF-8.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    match parts {
        Some(parts) => Some(parts.join("/")),
        None => {
            tracing::warn!(path = %path.display(), "skipping non UTF-8 path");
            None
        }
    }
}
