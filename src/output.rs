//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Files are shown by their path relative to the content directory, with
//! timestamps and change kinds as indented context lines. Edition items are
//! shown by title, in edition order.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Candidates (3 files)
//! 001 carnet.md
//!     Modified: 2025-03-06 12:00 UTC
//! 002 slowsia.md
//!     Modified: 2025-03-08 12:00 UTC
//! ...
//!
//! Next edition (2 files; 3 scanned, 2 unpublished or changed)
//! 001 slowsia.md [new]
//!     Modified: 2025-03-08 12:00 UTC
//! 002 carnet.md [modified]
//!     Modified: 2025-03-06 12:00 UTC
//! ```
//!
//! ## Build
//!
//! ```text
//! Run (scheduled) at 2025-03-09 08:00 UTC
//!     3 scanned, 2 unpublished or changed
//! Skipped
//!     broken.md: front matter in docs/broken.md: ...
//! Edition → site/newsletters/newsletter_20250309.html
//! 001 Slowsia
//! 002 Carnet
//! Copied 2 images, 4 editions in archive
//! Notification: sent https://news.example.org/newsletters/newsletter_20250309.html
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::pipeline::{Notification, Preview, RunOutcome, RunReport};
use crate::tracker::Tracker;
use crate::types::TrackedFile;
use chrono::{DateTime, Utc};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// `1 file`, `2 files`.
fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max).collect();
        format!("{kept}...")
    }
}

fn file_lines(index: usize, file: &TrackedFile, tag: Option<&str>) -> Vec<String> {
    let header = match tag {
        Some(tag) => format!("{} {} [{}]", format_index(index), file.path, tag),
        None => format!("{} {}", format_index(index), file.path),
    };
    vec![
        header,
        format!("{}Modified: {}", indent(1), format_time(file.modified)),
    ]
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_preview(preview: &Preview) -> Vec<String> {
    let mut lines = vec![format!(
        "Candidates ({})",
        plural(preview.candidates.len(), "file")
    )];
    for (i, file) in preview.candidates.iter().enumerate() {
        lines.extend(file_lines(i + 1, file, None));
    }

    lines.push(String::new());
    let delta = &preview.delta;
    lines.push(format!(
        "Next edition ({}; {})",
        plural(delta.entries.len(), "file"),
        delta.stats
    ));
    if delta.is_empty() {
        lines.push(format!("{}Nothing to publish", indent(1)));
    }
    for (i, entry) in delta.entries.iter().enumerate() {
        let change = entry.change.to_string();
        lines.extend(file_lines(i + 1, &entry.file, Some(&change)));
    }
    lines
}

pub fn print_preview(preview: &Preview) {
    for line in format_preview(preview) {
        println!("{}", line);
    }
}

// ============================================================================
// Status
// ============================================================================

/// Tracker state: counts, the last scan, then every processed file.
pub fn format_status(tracker: &Tracker, state_dir: &Path) -> Vec<String> {
    let mut lines = vec![format!("State: {}", state_dir.display())];
    lines.push(format!(
        "{}Processed: {}",
        indent(1),
        plural(tracker.processed().len(), "file")
    ));
    match tracker.last_scan() {
        Some(scan) => lines.push(format!(
            "{}Last scan: {} ({})",
            indent(1),
            format_time(scan.scanned_at),
            plural(scan.paths.len(), "file")
        )),
        None => lines.push(format!("{}Last scan: never", indent(1))),
    }

    if !tracker.processed().is_empty() {
        lines.push(String::new());
        lines.push("Processed".to_string());
        for (i, (path, modified)) in tracker.processed().iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), path));
            lines.push(format!("{}Published at: {}", indent(1), format_time(*modified)));
        }
    }
    lines
}

pub fn print_status(tracker: &Tracker, state_dir: &Path) {
    for line in format_status(tracker, state_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_run_report(report: &RunReport) -> Vec<String> {
    let mut lines = vec![
        format!("Run ({}) at {}", report.trigger, format_time(report.now)),
        format!("{}{}", indent(1), report.stats),
    ];

    if !report.skipped.is_empty() {
        lines.push("Skipped".to_string());
        for skipped in &report.skipped {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                skipped.path,
                truncate_desc(&skipped.reason, 80)
            ));
        }
    }

    match &report.outcome {
        RunOutcome::NothingToPublish => lines.push("Nothing to publish".to_string()),
        RunOutcome::Published {
            edition_path,
            titles,
            images_copied,
            archived,
            notification,
        } => {
            lines.push(format!("Edition → {}", edition_path.display()));
            for (i, title) in titles.iter().enumerate() {
                lines.push(format!("{} {}", format_index(i + 1), title));
            }
            lines.push(format!(
                "Copied {}, {} in archive",
                plural(*images_copied, "image"),
                plural(*archived, "edition")
            ));
            lines.push(format!("Notification: {}", notification_line(notification)));
        }
    }
    lines
}

fn notification_line(notification: &Notification) -> String {
    match notification {
        Notification::Disabled => "disabled".to_string(),
        Notification::NoPublicUrl => "skipped (site.public_url not set)".to_string(),
        Notification::Sent { url } => format!("sent {url}"),
        Notification::Failed { error } => format!("failed ({})", truncate_desc(error, 80)),
    }
}

pub fn print_run_report(report: &RunReport) {
    for line in format_run_report(report) {
        println!("{}", line);
    }
}
