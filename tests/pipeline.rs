//! End-to-end runs against a temporary portfolio.
//!
//! Each test builds a `docs/` tree with controlled modification times, drives
//! `pipeline::run` with an injected clock, and inspects the publish and state
//! directories afterwards.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use portfolio_digest::config::NewsletterConfig;
use portfolio_digest::pipeline::{self, RunError, RunOutcome, Workspace};
use portfolio_digest::types::{ChangeKind, Trigger};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + TimeDelta::days(i64::from(day))
}

struct Fixture {
    tmp: TempDir,
    config: NewsletterConfig,
}

impl Fixture {
    fn new() -> Self {
        let mut config = NewsletterConfig::default();
        config.selection.window_days = 0;
        Self {
            tmp: TempDir::new().unwrap(),
            config,
        }
    }

    fn docs(&self) -> PathBuf {
        self.tmp.path().join("portfolio/docs")
    }

    fn site(&self) -> PathBuf {
        self.tmp.path().join("site")
    }

    fn state(&self) -> PathBuf {
        self.tmp.path().join("state")
    }

    fn workspace(&self) -> Workspace {
        Workspace::new(
            self.tmp.path().join("portfolio"),
            self.site(),
            self.state(),
            self.config.clone(),
        )
    }

    fn write(&self, rel: &str, content: &str, day: u32) -> PathBuf {
        let path = self.docs().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        touch(&path, ts(day));
        path
    }

    fn run(&self, day: u32) -> Result<pipeline::RunReport, RunError> {
        pipeline::run(&self.workspace(), Trigger::Scheduled, ts(day), None)
    }

    fn state_bytes(&self) -> Vec<(String, Vec<u8>)> {
        let mut files: Vec<(String, Vec<u8>)> = fs::read_dir(self.state())
            .unwrap()
            .map(|e| e.unwrap())
            .map(|e| {
                (
                    e.file_name().into_string().unwrap(),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect();
        files.sort();
        files
    }
}

fn touch(path: &Path, modified: DateTime<Utc>) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(modified.into()).unwrap();
}

fn titles(report: &pipeline::RunReport) -> Vec<String> {
    match &report.outcome {
        RunOutcome::Published { titles, .. } => titles.clone(),
        RunOutcome::NothingToPublish => panic!("expected a published edition"),
    }
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[test]
fn first_run_publishes_everything() {
    let fx = Fixture::new();
    fx.write(
        "slowsia.md",
        "---\ntitle: Slowsia\ndescription: Slow travel in Asia\ntags: [travel, photo]\n---\n# Ignored heading\n\nText.",
        3,
    );
    fx.write("carnet/2024-carnet.md", "# Carnet\n\nNotes #sketch", 4);

    let report = fx.run(7).unwrap();
    assert_eq!(titles(&report), vec!["Carnet", "Slowsia"]);
    assert_eq!(report.stats.scanned, 2);

    let edition = fs::read_to_string(fx.site().join("newsletters/newsletter_20250308.html")).unwrap();
    assert!(edition.contains("Slow travel in Asia"));
    assert!(edition.contains("sketch"));
    assert!(fx.site().join("newsletters/latest.html").exists());
    assert!(fx.site().join("index.html").exists());

    let processed = fs::read_to_string(fx.state().join("processed_files.txt")).unwrap();
    assert!(processed.starts_with("# processed_files v1\n"));
    assert!(processed.contains("\tcarnet/2024-carnet.md\n"));
    assert!(processed.contains("\tslowsia.md\n"));
}

#[test]
fn rerun_publishes_nothing_new() {
    let fx = Fixture::new();
    fx.write("a.md", "# A", 1);
    fx.write("b.md", "# B", 2);
    fx.run(3).unwrap();

    let report = fx.run(4).unwrap();
    assert_eq!(report.outcome, RunOutcome::NothingToPublish);
    assert_eq!(report.stats.unpublished, 0);
    assert!(!fx.site().join("newsletters/newsletter_20250305.html").exists());
}

#[test]
fn modified_file_is_republished() {
    let fx = Fixture::new();
    let path = fx.write("a.md", "# A", 1);
    fx.write("b.md", "# B", 1);
    fx.run(2).unwrap();

    touch(&path, ts(5));
    let workspace = fx.workspace();
    let preview = pipeline::preview(&workspace, ts(6)).unwrap();
    assert_eq!(preview.delta.entries.len(), 1);
    assert_eq!(preview.delta.entries[0].change, ChangeKind::Modified);

    let report = fx.run(6).unwrap();
    assert_eq!(titles(&report), vec!["A"]);
}

#[test]
fn recorded_mtime_equal_is_not_republished() {
    let fx = Fixture::new();
    let path = fx.write("a.md", "# A", 1);
    fx.run(2).unwrap();

    touch(&path, ts(1));
    assert_eq!(fx.run(3).unwrap().outcome, RunOutcome::NothingToPublish);

    touch(&path, ts(1) + TimeDelta::seconds(1));
    assert_eq!(titles(&fx.run(4).unwrap()), vec!["A"]);
}

#[test]
fn cap_keeps_newest_six() {
    let mut fx = Fixture::new();
    fx.config.selection.max_items = 6;
    for day in 1..=8 {
        fx.write(&format!("p{day}.md"), &format!("# P{day}"), day);
    }

    let report = fx.run(9).unwrap();
    assert_eq!(titles(&report), vec!["P8", "P7", "P6", "P5", "P4", "P3"]);
    assert_eq!(report.stats.truncated, 2);

    // The two oldest stay pending and go out next time.
    let report = fx.run(10).unwrap();
    assert_eq!(titles(&report), vec!["P2", "P1"]);
}

#[test]
fn window_excludes_old_unpublished_file() {
    let mut fx = Fixture::new();
    fx.config.selection.window_days = 7;
    fx.write("old.md", "# Old", 2);
    fx.write("fresh.md", "# Fresh", 8);

    let report = fx.run(10).unwrap();
    assert_eq!(titles(&report), vec!["Fresh"]);
    assert_eq!(report.stats.dropped_by_window, 1);
}

#[test]
fn archive_lists_every_edition() {
    let fx = Fixture::new();
    fx.write("a.md", "# A", 1);
    fx.run(2).unwrap();
    fx.write("b.md", "# B", 8);
    let report = fx.run(9).unwrap();

    match report.outcome {
        RunOutcome::Published { archived, .. } => assert_eq!(archived, 2),
        other => panic!("expected a published edition, got {other:?}"),
    }
    let archive = fs::read_to_string(fx.site().join("newsletters/archives.html")).unwrap();
    assert!(archive.contains("newsletter_20250303.html"));
    assert!(archive.contains("newsletter_20250310.html"));
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[test]
fn empty_portfolio_publishes_and_commits_nothing() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.docs()).unwrap();

    let report = fx.run(1).unwrap();
    assert_eq!(report.outcome, RunOutcome::NothingToPublish);
    assert!(!fx.site().exists());
    assert!(!fx.state().exists());
}

#[test]
fn missing_content_dir_is_fatal() {
    let fx = Fixture::new();
    let result = fx.run(1);
    assert!(matches!(result, Err(RunError::Scan(_))));
}

#[test]
fn corrupt_state_aborts_before_writing() {
    let fx = Fixture::new();
    fx.write("a.md", "# A", 1);
    fs::create_dir_all(fx.state()).unwrap();
    fs::write(fx.state().join("processed_files.txt"), "not a state file\n").unwrap();

    let result = fx.run(2);
    assert!(matches!(result, Err(RunError::State(_))));
    assert!(!fx.site().exists());
    assert_eq!(
        fs::read_to_string(fx.state().join("processed_files.txt")).unwrap(),
        "not a state file\n"
    );
}

#[test]
fn failed_publish_leaves_state_untouched() {
    let fx = Fixture::new();
    fx.write("a.md", "# A", 1);
    fx.run(2).unwrap();
    let before = fx.state_bytes();

    fx.write("b.md", "# B", 3);
    fs::remove_dir_all(fx.site()).unwrap();
    fs::write(fx.site(), "a file where the publish directory should be").unwrap();

    let result = fx.run(4);
    assert!(matches!(result, Err(RunError::Publish(_))));
    assert_eq!(fx.state_bytes(), before);
}
