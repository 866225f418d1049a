//! Writing an edition to the publish directory.
//!
//! Stage 4 of the newsletter pipeline. Lays out a directory that any static
//! host (GitHub Pages in practice) can serve as-is:
//!
//! ```text
//! site/
//! ├── index.html                    # Redirect to newsletters/latest.html
//! ├── .nojekyll                     # Serve files verbatim on GitHub Pages
//! ├── CNAME                         # Only when publish.cname is set
//! └── newsletters/
//!     ├── newsletter_YYYYMMDD.html  # This edition
//!     ├── latest.html               # Copy of this edition
//!     ├── archives.html             # Every edition, newest first
//!     └── img/                      # Images used by editions
//! ```
//!
//! Earlier editions and their images are left in place; the archive is rebuilt
//! from whatever `newsletter_*.html` files the directory holds. A rerun on the
//! same day overwrites that day's edition.
//!
//! Any failed write aborts with [`PublishError`], and the caller must not
//! commit tracking state.

use crate::config::NewsletterConfig;
use crate::generate::{self, ArchiveEntry, RenderedEdition};
use crate::types::{Edition, ItemImage};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory of edition pages inside the publish root.
pub const NEWSLETTERS_DIR: &str = "newsletters";
/// Image directory inside [`NEWSLETTERS_DIR`].
pub const IMAGES_DIR: &str = "img";

/// Where things went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub edition_path: PathBuf,
    pub images_copied: usize,
    /// Editions listed in the archive, this one included.
    pub archived: usize,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PublishError + '_ {
    move |source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), PublishError> {
    fs::write(path, contents).map_err(io_error(path))
}

/// Write `rendered` and every supporting file under `output`.
///
/// `header_image` is copied alongside the edition's own images.
pub fn publish(
    edition: &Edition,
    rendered: &RenderedEdition,
    header_image: Option<&ItemImage>,
    output: &Path,
    config: &NewsletterConfig,
) -> Result<PublishReport, PublishError> {
    let newsletters = output.join(NEWSLETTERS_DIR);
    let images = newsletters.join(IMAGES_DIR);
    fs::create_dir_all(&images).map_err(io_error(&images))?;

    let images_copied = copy_images(edition, header_image, &images)?;

    let edition_path = newsletters.join(&rendered.file_name);
    write_file(&edition_path, rendered.html.as_bytes())?;
    write_file(&newsletters.join("latest.html"), rendered.html.as_bytes())?;
    tracing::info!(path = %edition_path.display(), "wrote edition");

    let entries = list_editions(&newsletters)?;
    let archive = generate::render_archive(&entries, config);
    write_file(
        &newsletters.join("archives.html"),
        archive.into_string().as_bytes(),
    )?;

    let redirect = generate::render_redirect(generate::LATEST_PATH);
    write_file(&output.join("index.html"), redirect.into_string().as_bytes())?;
    write_file(&output.join(".nojekyll"), b"")?;
    if let Some(cname) = config.publish.cname() {
        write_file(&output.join("CNAME"), format!("{cname}\n").as_bytes())?;
    }

    Ok(PublishReport {
        edition_path,
        images_copied,
        archived: entries.len(),
    })
}

/// Copy every local image the edition shows into `dest`.
fn copy_images(
    edition: &Edition,
    header_image: Option<&ItemImage>,
    dest: &Path,
) -> Result<usize, PublishError> {
    let mut sources: BTreeSet<(&str, &Path)> = BTreeSet::new();
    let item_images = edition
        .items
        .iter()
        .flat_map(|item| item.image.iter().chain(&item.inline_images));
    for image in header_image.into_iter().chain(item_images) {
        if let ItemImage::Local { file_name, source } = image {
            sources.insert((file_name.as_str(), source.as_path()));
        }
    }
    for (file_name, source) in &sources {
        let target = dest.join(file_name);
        fs::copy(source, &target).map_err(io_error(source))?;
        tracing::debug!(image = %file_name, "copied image");
    }
    Ok(sources.len())
}

/// Editions present in the newsletters directory, newest first.
pub fn list_editions(newsletters: &Path) -> Result<Vec<ArchiveEntry>, PublishError> {
    let mut entries: Vec<ArchiveEntry> = match fs::read_dir(newsletters) {
        Ok(dir) => dir
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .filter_map(|name| ArchiveEntry::from_file_name(&name))
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(source) => {
            return Err(PublishError::Io {
                path: newsletters.to_path_buf(),
                source,
            });
        }
    };
    entries.sort_by(|a, b| b.cmp(a));
    Ok(entries)
}
