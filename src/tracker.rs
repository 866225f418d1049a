//! Change tracking and publication state.
//!
//! The tracker decides which documents belong in this week's edition and
//! remembers what has already gone out, so a document is published again only
//! when it has changed since.
//!
//! # State cycle
//!
//! Every run goes through three phases, and only the last one touches disk:
//!
//! ```text
//! StateStore::load ──▶ Tracker ──compute_delta──▶ Delta ──▶ render + publish
//!                        │                                        │
//!                        └──────────commit(published, seen)◀──────┘
//!                                        │
//!                                StateStore::save
//! ```
//!
//! [`Tracker::compute_delta`] and [`Tracker::commit`] are pure: the first
//! reads the snapshot, the second returns a new one. If rendering or
//! publishing fails the new snapshot is never saved and the files on disk are
//! left exactly as they were.
//!
//! ## Selection rule
//!
//! A scanned file is unpublished or changed when its path is missing from the
//! processed set, or its recorded time is strictly older than its current
//! modification time. Equal times mean "already published". The
//! [`select`](crate::select) policy then applies the window, ordering, and cap.
//!
//! ## Storage
//!
//! Two line-oriented text files in the state directory:
//!
//! ```text
//! processed_files.txt               last_scan_files.txt
//! ───────────────────               ───────────────────
//! # processed_files v1              # last_scan_files v1
//! 2025-03-20T09:14:03.120000000Z\ta.md   # scanned_at 2025-03-23T08:00:00Z
//! 2025-03-21T18:40:51.000000000Z\tb.md   a.md
//!                                   b.md
//! ```
//!
//! Times are RFC 3339 with nanoseconds so a recorded time compares exactly
//! against the next scan. Lines are sorted by path. A missing file means no
//! run has committed yet. Any other content that does not parse is reported
//! as corruption and the run stops before writing anything. Both files are
//! first written to temporary siblings; only when both are on disk are they
//! renamed into place, one right after the other.
//!
//! Deleted source files are never pruned from the processed set.

use crate::select::{self, SelectionPolicy};
use crate::types::{ChangeKind, DeltaEntry, TrackedFile};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Processed set file name within the state directory.
pub const PROCESSED_FILENAME: &str = "processed_files.txt";
/// Last scan snapshot file name within the state directory.
pub const LAST_SCAN_FILENAME: &str = "last_scan_files.txt";

const PROCESSED_HEADER: &str = "# processed_files v1";
const LAST_SCAN_HEADER: &str = "# last_scan_files v1";
const SCANNED_AT_PREFIX: &str = "# scanned_at ";

#[derive(Error, Debug)]
pub enum StateError {
    #[error("state IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt state file {path} (line {line}): {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Paths observed by the last committed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanState {
    pub scanned_at: DateTime<Utc>,
    pub paths: BTreeSet<String>,
}

/// Snapshot of the publication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tracker {
    /// Path → modification time at which it was last published.
    processed: BTreeMap<String, DateTime<Utc>>,
    last_scan: Option<ScanState>,
}

/// Files selected for one edition, plus how the selection went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pub entries: Vec<DeltaEntry>,
    pub stats: DeltaStats,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaStats {
    /// Files the scanner reported.
    pub scanned: usize,
    /// Files never published or changed since.
    pub unpublished: usize,
    pub dropped_by_window: usize,
    pub truncated: usize,
}

impl fmt::Display for DeltaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scanned, {} unpublished or changed",
            self.scanned, self.unpublished
        )?;
        if self.dropped_by_window > 0 {
            write!(f, ", {} outside window", self.dropped_by_window)?;
        }
        if self.truncated > 0 {
            write!(f, ", {} over cap", self.truncated)?;
        }
        Ok(())
    }
}

impl Tracker {
    pub fn new(processed: BTreeMap<String, DateTime<Utc>>, last_scan: Option<ScanState>) -> Self {
        Self {
            processed,
            last_scan,
        }
    }

    pub fn processed(&self) -> &BTreeMap<String, DateTime<Utc>> {
        &self.processed
    }

    pub fn last_scan(&self) -> Option<&ScanState> {
        self.last_scan.as_ref()
    }

    /// `None` when `file` is already published at its current time.
    pub fn classify(&self, file: &TrackedFile) -> Option<ChangeKind> {
        match self.processed.get(&file.path) {
            Some(recorded) if *recorded >= file.modified => None,
            Some(_) => Some(ChangeKind::Modified),
            None => {
                let seen_before = self
                    .last_scan
                    .as_ref()
                    .is_some_and(|s| s.paths.contains(&file.path));
                Some(if seen_before {
                    ChangeKind::Pending
                } else {
                    ChangeKind::New
                })
            }
        }
    }

    /// Select the files for this edition. Reads the snapshot only.
    pub fn compute_delta(
        &self,
        candidates: &[TrackedFile],
        policy: &SelectionPolicy,
        now: DateTime<Utc>,
    ) -> Delta {
        let eligible: Vec<DeltaEntry> = candidates
            .iter()
            .filter_map(|file| {
                self.classify(file).map(|change| DeltaEntry {
                    file: file.clone(),
                    change,
                })
            })
            .collect();
        let unpublished = eligible.len();
        let selection = select::select(eligible, policy, now);

        Delta {
            entries: selection.entries,
            stats: DeltaStats {
                scanned: candidates.len(),
                unpublished,
                dropped_by_window: selection.dropped_by_window,
                truncated: selection.truncated,
            },
        }
    }

    /// Snapshot after publishing `published`, with `seen` as the new scan.
    pub fn commit(
        &self,
        published: &[TrackedFile],
        seen: &[TrackedFile],
        now: DateTime<Utc>,
    ) -> Tracker {
        let mut processed = self.processed.clone();
        for file in published {
            processed.insert(file.path.clone(), file.modified);
        }
        Tracker {
            processed,
            last_scan: Some(ScanState {
                scanned_at: now,
                paths: seen.iter().map(|f| f.path.clone()).collect(),
            }),
        }
    }
}

// =============================================================================
// Persistence
// =============================================================================

/// The state directory holding both tracking files.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn processed_path(&self) -> PathBuf {
        self.dir.join(PROCESSED_FILENAME)
    }

    pub fn last_scan_path(&self) -> PathBuf {
        self.dir.join(LAST_SCAN_FILENAME)
    }

    /// Load the snapshot. Missing files read as a first run.
    pub fn load(&self) -> Result<Tracker, StateError> {
        let processed_path = self.processed_path();
        let processed = match read_optional(&processed_path)? {
            Some(content) => parse_processed(&content, &processed_path)?,
            None => BTreeMap::new(),
        };
        let last_scan_path = self.last_scan_path();
        let last_scan = match read_optional(&last_scan_path)? {
            Some(content) => Some(parse_last_scan(&content, &last_scan_path)?),
            None => None,
        };
        tracing::debug!(
            dir = %self.dir.display(),
            processed = processed.len(),
            has_last_scan = last_scan.is_some(),
            "loaded tracking state"
        );
        Ok(Tracker::new(processed, last_scan))
    }

    /// Persist the snapshot, replacing each file atomically.
    pub fn save(&self, tracker: &Tracker) -> Result<(), StateError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StateError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let mut staged = vec![(
            self.processed_path(),
            render_processed(&tracker.processed),
        )];
        if let Some(scan) = &tracker.last_scan {
            staged.push((self.last_scan_path(), render_last_scan(scan)));
        }

        let mut temps: Vec<(PathBuf, PathBuf)> = Vec::new();
        for (path, contents) in &staged {
            match write_temp(path, contents) {
                Ok(tmp) => temps.push((tmp, path.clone())),
                Err(e) => {
                    for (tmp, _) in &temps {
                        let _ = std::fs::remove_file(tmp);
                    }
                    return Err(e);
                }
            }
        }
        for (tmp, path) in &temps {
            std::fs::rename(tmp, path).map_err(|source| StateError::Io {
                path: path.clone(),
                source,
            })?;
        }
        tracing::info!(
            dir = %self.dir.display(),
            processed = tracker.processed.len(),
            "saved tracking state"
        );
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StateError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Err(StateError::Corrupt {
            path: path.to_path_buf(),
            line: 0,
            reason: "not valid UTF-8".into(),
        }),
        Err(source) => Err(StateError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write `contents` next to `path` as `<name>.tmp` and flush it to disk.
fn write_temp(path: &Path, contents: &str) -> Result<PathBuf, StateError> {
    let io_err = |source: std::io::Error| StateError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let mut file = std::fs::File::create(&tmp).map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    Ok(tmp)
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Body lines after the header, numbered from 1, blank lines skipped.
fn body_lines<'a>(
    content: &'a str,
    header: &str,
    path: &Path,
) -> Result<impl Iterator<Item = (usize, &'a str)>, StateError> {
    let mut lines = content.lines().enumerate().map(|(i, l)| (i + 1, l));
    match lines.next() {
        Some((_, first)) if first.trim_end() == header => {}
        _ => {
            return Err(StateError::Corrupt {
                path: path.to_path_buf(),
                line: 1,
                reason: format!("expected header `{header}`"),
            });
        }
    }
    Ok(lines.filter(|(_, l)| !l.trim().is_empty()))
}

fn parse_processed(
    content: &str,
    path: &Path,
) -> Result<BTreeMap<String, DateTime<Utc>>, StateError> {
    let corrupt = |line: usize, reason: String| StateError::Corrupt {
        path: path.to_path_buf(),
        line,
        reason,
    };
    let mut processed = BTreeMap::new();
    for (n, line) in body_lines(content, PROCESSED_HEADER, path)? {
        let (raw_time, file) = line
            .split_once('\t')
            .ok_or_else(|| corrupt(n, "expected `<time>\\t<path>`".into()))?;
        let time = parse_time(raw_time)
            .ok_or_else(|| corrupt(n, format!("invalid timestamp `{raw_time}`")))?;
        if file.is_empty() {
            return Err(corrupt(n, "empty path".into()));
        }
        if processed.insert(file.to_string(), time).is_some() {
            return Err(corrupt(n, format!("duplicate path `{file}`")));
        }
    }
    Ok(processed)
}

fn parse_last_scan(content: &str, path: &Path) -> Result<ScanState, StateError> {
    let corrupt = |line: usize, reason: String| StateError::Corrupt {
        path: path.to_path_buf(),
        line,
        reason,
    };
    let mut lines = body_lines(content, LAST_SCAN_HEADER, path)?;
    let scanned_at = match lines.next() {
        Some((n, line)) => {
            let raw = line
                .strip_prefix(SCANNED_AT_PREFIX)
                .ok_or_else(|| corrupt(n, format!("expected `{SCANNED_AT_PREFIX}<time>`")))?;
            parse_time(raw.trim()).ok_or_else(|| corrupt(n, format!("invalid timestamp `{raw}`")))?
        }
        None => return Err(corrupt(2, "missing scan time".into())),
    };
    let mut paths = BTreeSet::new();
    for (n, line) in lines {
        if !paths.insert(line.to_string()) {
            return Err(corrupt(n, format!("duplicate path `{line}`")));
        }
    }
    Ok(ScanState { scanned_at, paths })
}

fn render_processed(processed: &BTreeMap<String, DateTime<Utc>>) -> String {
    let mut out = format!("{PROCESSED_HEADER}\n");
    for (path, time) in processed {
        out.push_str(&format!("{}\t{}\n", format_time(time), path));
    }
    out
}

fn render_last_scan(scan: &ScanState) -> String {
    let mut out = format!(
        "{LAST_SCAN_HEADER}\n{SCANNED_AT_PREFIX}{}\n",
        format_time(&scan.scanned_at)
    );
    for path in &scan.paths {
        out.push_str(path);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use chrono::TimeDelta;
    use tempfile::TempDir;

    fn no_window(max_items: usize) -> SelectionPolicy {
        SelectionPolicy::new(max_items, 0)
    }

    fn delta_paths(delta: &Delta) -> Vec<&str> {
        delta.entries.iter().map(|e| e.file.path.as_str()).collect()
    }

    fn processed_at(entries: &[(&str, u32)]) -> Tracker {
        let processed = entries
            .iter()
            .map(|(path, day)| (path.to_string(), ts(*day)))
            .collect();
        Tracker::new(processed, None)
    }

    // =========================================================================
    // compute_delta
    // =========================================================================

    #[test]
    fn first_run_takes_six_newest() {
        let candidates: Vec<_> = (1..=8).map(|d| tracked(&format!("doc{d}.md"), d)).collect();
        let delta = Tracker::default().compute_delta(&candidates, &no_window(6), ts(10));

        assert_eq!(
            delta_paths(&delta),
            vec!["doc8.md", "doc7.md", "doc6.md", "doc5.md", "doc4.md", "doc3.md"]
        );
        assert_eq!(delta.stats.scanned, 8);
        assert_eq!(delta.stats.unpublished, 8);
        assert_eq!(delta.stats.truncated, 2);
    }

    #[test]
    fn same_mtime_is_already_published() {
        let tracker = processed_at(&[("a.md", 5)]);
        let delta = tracker.compute_delta(&[tracked("a.md", 5)], &no_window(6), ts(10));
        assert!(delta.is_empty());
    }

    #[test]
    fn newer_mtime_is_modified() {
        let tracker = processed_at(&[("a.md", 5)]);
        let delta = tracker.compute_delta(&[tracked("a.md", 6)], &no_window(6), ts(10));
        assert_eq!(delta_paths(&delta), vec!["a.md"]);
        assert_eq!(delta.entries[0].change, ChangeKind::Modified);
    }

    #[test]
    fn one_nanosecond_newer_counts_as_change() {
        let tracker = processed_at(&[("a.md", 5)]);
        let file = TrackedFile::new("a.md", ts(5) + TimeDelta::nanoseconds(1));
        let delta = tracker.compute_delta(&[file], &no_window(6), ts(10));
        assert_eq!(delta.entries.len(), 1);
    }

    #[test]
    fn older_mtime_is_not_republished() {
        let tracker = processed_at(&[("a.md", 5)]);
        let delta = tracker.compute_delta(&[tracked("a.md", 4)], &no_window(6), ts(10));
        assert!(delta.is_empty());
    }

    #[test]
    fn window_excludes_old_unpublished_file() {
        let policy = SelectionPolicy::new(6, 7);
        let delta = Tracker::default().compute_delta(&[tracked("old.md", 2)], &policy, ts(10));
        assert!(delta.is_empty());
        assert_eq!(delta.stats.dropped_by_window, 1);
    }

    #[test]
    fn pending_when_seen_in_previous_scan() {
        let tracker = Tracker::default().commit(&[], &[tracked("seen.md", 1)], ts(2));
        let delta = tracker.compute_delta(
            &[tracked("seen.md", 1), tracked("fresh.md", 3)],
            &no_window(6),
            ts(4),
        );
        assert_eq!(delta.entries[0].file.path, "fresh.md");
        assert_eq!(delta.entries[0].change, ChangeKind::New);
        assert_eq!(delta.entries[1].file.path, "seen.md");
        assert_eq!(delta.entries[1].change, ChangeKind::Pending);
    }

    #[test]
    fn compute_delta_is_idempotent() {
        let tracker = processed_at(&[("a.md", 1), ("b.md", 3)]);
        let candidates = vec![
            tracked("a.md", 2),
            tracked("b.md", 3),
            tracked("c.md", 2),
            tracked("d.md", 4),
        ];
        let policy = no_window(2);
        let first = tracker.compute_delta(&candidates, &policy, ts(5));
        let second = tracker.compute_delta(&candidates, &policy, ts(5));
        assert_eq!(first, second);
        assert_eq!(delta_paths(&first), vec!["d.md", "a.md"]);
    }

    #[test]
    fn delta_never_exceeds_cap() {
        let candidates: Vec<_> = (1..=20).map(|d| tracked(&format!("{d:02}.md"), d)).collect();
        for cap in 1..=8 {
            let delta = Tracker::default().compute_delta(&candidates, &no_window(cap), ts(30));
            assert!(delta.entries.len() <= cap);
        }
    }

    // =========================================================================
    // commit
    // =========================================================================

    #[test]
    fn commit_then_rerun_selects_nothing() {
        let candidates = vec![tracked("a.md", 1), tracked("b.md", 2)];
        let policy = no_window(6);
        let delta = Tracker::default().compute_delta(&candidates, &policy, ts(3));
        let published: Vec<_> = delta.entries.iter().map(|e| e.file.clone()).collect();

        let next = Tracker::default().commit(&published, &candidates, ts(3));
        assert!(next.compute_delta(&candidates, &policy, ts(4)).is_empty());
    }

    #[test]
    fn commit_records_only_published_files() {
        let seen = vec![tracked("a.md", 1), tracked("b.md", 2)];
        let next = Tracker::default().commit(&seen[..1], &seen, ts(3));
        assert_eq!(next.processed().len(), 1);
        assert_eq!(next.processed().get("a.md"), Some(&ts(1)));

        let scan = next.last_scan().unwrap();
        assert_eq!(scan.scanned_at, ts(3));
        assert_eq!(scan.paths.len(), 2);
    }

    #[test]
    fn commit_replaces_scan_state() {
        let first = Tracker::default().commit(&[], &[tracked("gone.md", 1)], ts(2));
        let second = first.commit(&[], &[tracked("new.md", 3)], ts(4));
        let paths: Vec<_> = second.last_scan().unwrap().paths.iter().cloned().collect();
        assert_eq!(paths, vec!["new.md"]);
    }

    #[test]
    fn commit_keeps_entries_for_deleted_sources() {
        let tracker = processed_at(&[("deleted.md", 1)]);
        let next = tracker.commit(&[tracked("a.md", 2)], &[tracked("a.md", 2)], ts(3));
        assert!(next.processed().contains_key("deleted.md"));
    }

    #[test]
    fn commit_does_not_mutate_original() {
        let tracker = Tracker::default();
        let _ = tracker.commit(&[tracked("a.md", 1)], &[tracked("a.md", 1)], ts(2));
        assert!(tracker.processed().is_empty());
        assert!(tracker.last_scan().is_none());
    }

    // =========================================================================
    // StateStore
    // =========================================================================

    #[test]
    fn load_missing_state_is_first_run() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path().join("state"));
        assert_eq!(store.load().unwrap(), Tracker::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path().join("state"));
        let published = TrackedFile::new("dir/a.md", ts(1) + TimeDelta::nanoseconds(123_456_789));
        let tracker =
            Tracker::default().commit(&[published.clone()], &[published, tracked("b.md", 2)], ts(3));

        store.save(&tracker).unwrap();
        assert_eq!(store.load().unwrap(), tracker);
    }

    #[test]
    fn saved_files_use_documented_layout() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        let files = vec![tracked("b.md", 2), tracked("a.md", 1)];
        store
            .save(&Tracker::default().commit(&files, &files, ts(3)))
            .unwrap();

        let processed = std::fs::read_to_string(store.processed_path()).unwrap();
        let lines: Vec<&str> = processed.lines().collect();
        assert_eq!(lines[0], "# processed_files v1");
        assert!(lines[1].ends_with("\ta.md"));
        assert!(lines[2].ends_with("\tb.md"));

        let last_scan = std::fs::read_to_string(store.last_scan_path()).unwrap();
        let lines: Vec<&str> = last_scan.lines().collect();
        assert_eq!(lines[0], "# last_scan_files v1");
        assert!(lines[1].starts_with("# scanned_at "));
        assert_eq!(&lines[2..], &["a.md", "b.md"]);
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        store
            .save(&Tracker::default().commit(&[], &[], ts(1)))
            .unwrap();
        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{names:?}");
    }

    #[test]
    fn failed_scan_write_keeps_processed_file() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        let first = vec![tracked("a.md", 1)];
        store
            .save(&Tracker::default().commit(&first, &first, ts(2)))
            .unwrap();
        let before = std::fs::read(store.processed_path()).unwrap();

        // A directory in the way of the scan snapshot's temporary file.
        std::fs::create_dir(tmp.path().join("last_scan_files.txt.tmp")).unwrap();
        let second = vec![tracked("a.md", 1), tracked("b.md", 3)];
        let tracker = store.load().unwrap().commit(&second, &second, ts(4));
        assert!(matches!(store.save(&tracker), Err(StateError::Io { .. })));

        assert_eq!(std::fs::read(store.processed_path()).unwrap(), before);
        assert!(!tmp.path().join("processed_files.txt.tmp").exists());
    }

    #[test]
    fn load_rejects_missing_header() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        std::fs::write(store.processed_path(), "a.md\n").unwrap();
        assert!(matches!(
            store.load(),
            Err(StateError::Corrupt { line: 1, .. })
        ));
    }

    #[test]
    fn load_rejects_bad_timestamp() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        std::fs::write(
            store.processed_path(),
            "# processed_files v1\nyesterday\ta.md\n",
        )
        .unwrap();
        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"), "{err}");
    }

    #[test]
    fn load_rejects_line_without_tab() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        std::fs::write(
            store.processed_path(),
            "# processed_files v1\n2025-03-01T00:00:00Z a.md\n",
        )
        .unwrap();
        assert!(matches!(
            store.load(),
            Err(StateError::Corrupt { line: 2, .. })
        ));
    }

    #[test]
    fn load_rejects_last_scan_without_time() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        std::fs::write(store.last_scan_path(), "# last_scan_files v1\na.md\n").unwrap();
        assert!(matches!(store.load(), Err(StateError::Corrupt { .. })));
    }

    #[test]
    fn load_rejects_non_utf8() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        std::fs::write(store.processed_path(), [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(store.load(), Err(StateError::Corrupt { .. })));
    }

    #[test]
    fn stats_display_mentions_drops() {
        let stats = DeltaStats {
            scanned: 10,
            unpublished: 4,
            dropped_by_window: 1,
            truncated: 0,
        };
        assert_eq!(
            stats.to_string(),
            "10 scanned, 4 unpublished or changed, 1 outside window"
        );
    }
}
