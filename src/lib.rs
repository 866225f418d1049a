//! # Portfolio Digest
//!
//! Turns a directory of portfolio write-ups into a weekly HTML newsletter and
//! remembers what it already sent. The filesystem is the data source: every
//! Markdown file under the content directory is a project, its modification
//! time says when it last changed, and two small text files in a state
//! directory record what has been published.
//!
//! # Architecture: One Run, Three-Phase State Cycle
//!
//! ```text
//! 1. Load      state dir       →  Tracker         (snapshot, read-only)
//! 2. Select    docs/ + Tracker →  Delta           (pure: new or changed, newest first, capped)
//! 3. Publish   Delta           →  site/           (render + write edition, archive, images)
//! 4. Commit    Tracker + Delta →  state dir       (atomic rewrite, only after 3 succeeded)
//! 5. Notify    edition URL     →  LinkedIn        (best effort)
//! ```
//!
//! The delta is a pure function of the snapshot, the scanned files, the
//! selection policy and the injected run time. Calling it twice gives the same
//! answer, which is what makes `scan` a faithful preview of `build`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the content directory for Markdown files and their modification times |
//! | [`tracker`] | Publication state: change detection, commit, line-oriented persistence |
//! | [`select`] | Window filter, newest-first ordering and the per-edition cap |
//! | [`metadata`] | Front matter, titles, descriptions, tags and image resolution for one file |
//! | [`generate`] | Edition, archive and redirect pages rendered with Maud |
//! | [`publish`] | Writes the publish directory and copies images |
//! | [`notify`] | Announcement text and the LinkedIn share client |
//! | [`pipeline`] | One run end to end, plus the read-only preview |
//! | [`config`] | `newsletter.toml` loading, validation, merging, and CSS generation |
//! | [`types`] | Shared types (`TrackedFile`, `Edition`, `Trigger`) |
//! | [`naming`] | File-stem conventions: display titles, slugs, anchors |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Modification Time Is the Version
//!
//! A file is due when it has never been published or when its modification
//! time is strictly newer than the one recorded at publication. No content
//! hashing: touching a file republishes it, which is the intended way to
//! feature a project again.
//!
//! ## Commit After Publish
//!
//! State is rewritten only once the edition, `latest.html` and the archive are
//! on disk. A failed write leaves the state files byte-identical, so the next
//! run retries the same items. Each state file is replaced via a temporary
//! file and a rename.
//!
//! ## Maud Over Template Engines
//!
//! Pages are built with [Maud](https://maud.lambda.xyz/). Every page is a typed
//! struct rendered by a pure function, so a missing field is a compile error
//! and all interpolation is escaped.

pub mod config;
pub mod generate;
pub mod metadata;
pub mod naming;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod scan;
pub mod select;
pub mod tracker;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
