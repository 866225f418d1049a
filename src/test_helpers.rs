//! Shared test utilities for the portfolio-digest test suite.
//!
//! Provides fixed timestamps, fixture writers that control modification
//! times, and lookup helpers over edition items.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_md(tmp.path(), "docs/slowsia.md", "# Slowsia", ts(3));
//!
//! let files = scan(&tmp.path().join("docs")).unwrap();
//! assert_eq!(files[0].modified, ts(3));
//! ```

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::path::{Path, PathBuf};

use crate::types::{ChangeKind, Edition, EditionItem, TrackedFile};

// =========================================================================
// Timestamps
// =========================================================================

/// Noon UTC on day `day` of a fixed reference month (day 0 is 2025-03-01).
pub fn ts(day: u32) -> DateTime<Utc> {
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    base + TimeDelta::days(i64::from(day))
}

/// A scanned file stamped at [`ts`]`(day)`.
pub fn tracked(path: &str, day: u32) -> TrackedFile {
    TrackedFile::new(path, ts(day))
}

// =========================================================================
// Fixture writers
// =========================================================================

/// Write `content` to `root/rel`, creating parents, and set its mtime.
pub fn write_md(root: &Path, rel: &str, content: &str, modified: DateTime<Utc>) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    set_mtime(&path, modified);
    path
}

/// Set a file's modification time.
pub fn set_mtime(path: &Path, modified: DateTime<Utc>) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(modified.into()).unwrap();
}

/// Write a placeholder image file. Contents are never decoded.
pub fn write_asset(dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, format!("image bytes for {name}")).unwrap();
    path
}

// =========================================================================
// Edition builders
// =========================================================================

/// An item with predictable fields derived from `title`.
pub fn sample_item(title: &str) -> EditionItem {
    let stem = crate::naming::slugify(title);
    EditionItem {
        file: TrackedFile::new(format!("{stem}.md"), ts(1)),
        change: ChangeKind::New,
        title: title.to_string(),
        description: format!("About {title}"),
        excerpt: format!("Excerpt of {title}"),
        body: format!("# {title}\n\nBody of **{title}**.\n"),
        tags: vec!["portfolio".to_string()],
        url: None,
        image: None,
        inline_images: vec![],
        anchor: crate::naming::anchor_id(&stem),
    }
}

/// An edition published at [`ts`]`(day)` holding one sample item per title.
pub fn sample_edition(day: u32, titles: &[&str]) -> Edition {
    Edition {
        published_at: ts(day),
        items: titles.iter().map(|t| sample_item(t)).collect(),
    }
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find an item by title. Panics if not found.
pub fn find_item<'a>(items: &'a [EditionItem], title: &str) -> &'a EditionItem {
    items.iter().find(|i| i.title == title).unwrap_or_else(|| {
        let titles = item_titles(items);
        panic!("item '{title}' not found. Available: {titles:?}")
    })
}

/// All item titles in edition order.
pub fn item_titles(items: &[EditionItem]) -> Vec<&str> {
    items.iter().map(|i| i.title.as_str()).collect()
}
