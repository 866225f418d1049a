//! Document metadata extraction and resolution.
//!
//! Each selected document becomes an [`EditionItem`]. Its fields come from
//! up to three sources, resolved independently:
//!
//! ## Front matter
//!
//! An optional YAML block between two `---` lines at the top of the file:
//!
//! ```text
//! ---
//! title: Slowsia
//! description: Carnet de voyage en Asie du Sud-Est
//! tags: [voyage, photo]        # or "voyage, photo"
//! url: https://example.org/slowsia
//! image: slowsia-cover.jpg
//! ---
//! ```
//!
//! Unknown keys are ignored. An opening `---` with no closing line is read as
//! plain Markdown.
//!
//! ## Resolution priority
//!
//! The first non-empty value wins:
//!
//! - **Title**: front matter → first heading → file stem, title-cased
//! - **Description**: front matter → start of the plain text
//! - **Tags**: front matter → `#hashtags` in the plain text → default tags
//! - **Image**: front matter → first Markdown image → first `<img src>` →
//!   asset whose stem matches the slugified title
//!
//! Remote image URLs are referenced as they are. Local references are reduced
//! to their file name and must exist in the assets directory; a reference that
//! does not is skipped with a warning and the next source is tried.

use crate::config::ContentConfig;
use crate::naming;
use crate::types::{DeltaEntry, EditionItem, ItemImage};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::{Captures, Regex};
use serde_yaml::Value;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not valid UTF-8")]
    NotUtf8(PathBuf),
    #[error("invalid front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("front matter in {0} is not a key/value mapping")]
    FrontMatterShape(PathBuf),
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp"];

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)#([\p{L}\p{N}_-]+)").expect("hashtag pattern is valid")
});

static HTML_IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("img pattern is valid")
});

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value.
///
/// ```text
/// title:       resolve(&[front_matter_title, first_heading, stem_title])
/// description: resolve(&[front_matter_description, plain_text_start])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Fields read from a front matter block. All optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub url: Option<String>,
    pub image: Option<String>,
}

impl FrontMatter {
    /// Parse a YAML block. An empty block yields empty fields.
    pub fn parse(yaml: &str, path: &Path) -> Result<Self, MetadataError> {
        let value: Value =
            serde_yaml::from_str(yaml).map_err(|source| MetadataError::FrontMatter {
                path: path.to_path_buf(),
                source,
            })?;
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(map) => map,
            _ => return Err(MetadataError::FrontMatterShape(path.to_path_buf())),
        };
        let field = |key: &str| map.get(key).and_then(scalar_string);
        Ok(Self {
            title: field("title"),
            description: field("description"),
            tags: map.get("tags").map(tag_list).unwrap_or_default(),
            url: field("url"),
            image: field("image"),
        })
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Tags given as a YAML list or a comma-separated string.
fn tag_list(value: &Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_string).collect(),
        Value::String(s) => s.split(',').map(String::from).collect(),
        other => scalar_string(other).into_iter().collect(),
    };
    raw.into_iter()
        .map(|t| t.trim().trim_start_matches('#').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Split a leading `---` block from the Markdown body.
///
/// Returns `None` when the document does not start with a complete block.
pub fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }
    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == "---" {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Text content of rendered Markdown, whitespace collapsed.
///
/// HTML tags and image alt text are dropped.
pub fn plain_text(markdown: &str) -> String {
    let mut text = String::new();
    let mut image_depth = 0usize;
    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Image { .. }) => image_depth += 1,
            Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
            Event::Text(t) | Event::Code(t) if image_depth == 0 => text.push_str(&t),
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote(_)
                | TagEnd::TableCell,
            ) => text.push(' '),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the first heading of any level.
pub fn first_heading(markdown: &str) -> Option<String> {
    let mut in_heading = false;
    let mut heading = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { .. }) => in_heading = true,
            Event::End(TagEnd::Heading(_)) => {
                let trimmed = heading.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
                in_heading = false;
            }
            Event::Text(t) | Event::Code(t) if in_heading => heading.push_str(&t),
            _ => {}
        }
    }
    None
}

/// `#hashtags` in order of first appearance, without duplicates.
pub fn hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for cap in HASHTAG.captures_iter(text) {
        let tag = cap[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// First `max_chars` characters, with `...` appended when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", text[..byte_idx].trim_end()),
        None => text.to_string(),
    }
}

/// Destinations of every Markdown image in the body, in order.
pub fn markdown_image_refs(markdown: &str) -> Vec<String> {
    Parser::new(markdown)
        .filter_map(|event| match event {
            Event::Start(Tag::Image { dest_url, .. }) => Some(dest_url.to_string()),
            _ => None,
        })
        .collect()
}

/// `src` of every raw HTML `<img>` in the body, in order.
pub fn html_image_refs(markdown: &str) -> Vec<String> {
    HTML_IMG_SRC
        .captures_iter(markdown)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Point local `<img src>` values in an HTML fragment at `img/<file name>`.
pub fn rewrite_html_image_srcs(html: &str) -> Cow<'_, str> {
    HTML_IMG_SRC.replace_all(html, |caps: &Captures| {
        let (Some(whole), Some(src)) = (caps.get(0), caps.get(1)) else {
            return caps[0].to_string();
        };
        if is_remote(src.as_str()) {
            return whole.as_str().to_string();
        }
        let file_name = src.as_str().rsplit(['/', '\\']).next().unwrap_or_default();
        let text = whole.as_str();
        let start = src.start() - whole.start();
        let end = src.end() - whole.start();
        format!("{}img/{file_name}{}", &text[..start], &text[end..])
    })
}

/// Card image candidates in the body: first Markdown image, then first `<img src>`.
fn body_image_refs(markdown: &str) -> Vec<String> {
    let mut refs: Vec<String> = markdown_image_refs(markdown).into_iter().take(1).collect();
    refs.extend(html_image_refs(markdown).into_iter().take(1));
    refs
}

/// Whether an image reference points outside the publish directory.
pub fn is_remote(reference: &str) -> bool {
    let lower = reference.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Whether a file name has an image extension.
pub fn is_image_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
}

// =============================================================================
// Assets
// =============================================================================

/// Image files available in the portfolio assets directory.
#[derive(Debug, Clone, Default)]
pub struct AssetIndex {
    dir: PathBuf,
    /// File names, sorted.
    files: Vec<String>,
}

impl AssetIndex {
    /// List image files in `dir`. A missing directory is an empty index.
    pub fn load(dir: &Path) -> Self {
        let mut files: Vec<String> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
                .filter_map(|e| e.file_name().into_string().ok())
                .filter(|name| is_image_file(name))
                .collect(),
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "no assets directory");
                Vec::new()
            }
        };
        files.sort();
        Self {
            dir: dir.to_path_buf(),
            files,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Look up an asset by exact file name.
    pub fn get(&self, file_name: &str) -> Option<ItemImage> {
        self.files
            .iter()
            .find(|f| f.as_str() == file_name)
            .map(|f| self.local(f))
    }

    /// Resolve a reference from front matter or the body.
    ///
    /// Relative paths such as `../img/cover.jpg` are reduced to their file name.
    pub fn resolve_reference(&self, reference: &str) -> Option<ItemImage> {
        let reference = reference.trim();
        if is_remote(reference) {
            return Some(ItemImage::Remote(reference.to_string()));
        }
        let file_name = reference.rsplit(['/', '\\']).next()?;
        self.get(file_name)
    }

    /// First asset whose stem contains, or is contained in, `slug`.
    pub fn match_slug(&self, slug: &str) -> Option<ItemImage> {
        if slug.is_empty() {
            return None;
        }
        self.files
            .iter()
            .find(|name| {
                let stem = Path::new(name.as_str())
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(naming::slugify)
                    .unwrap_or_default();
                !stem.is_empty() && (stem.contains(slug) || slug.contains(stem.as_str()))
            })
            .map(|f| self.local(f))
    }

    fn local(&self, file_name: &str) -> ItemImage {
        ItemImage::Local {
            file_name: file_name.to_string(),
            source: self.dir.join(file_name),
        }
    }
}

// =============================================================================
// Item loading
// =============================================================================

/// Read a delta entry from disk and resolve its metadata.
pub fn load_item(
    entry: &DeltaEntry,
    content_root: &Path,
    assets: &AssetIndex,
    settings: &ContentConfig,
) -> Result<EditionItem, MetadataError> {
    let path = content_root.join(&entry.file.path);
    let bytes = std::fs::read(&path).map_err(|source| MetadataError::Io {
        path: path.clone(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|_| MetadataError::NotUtf8(path.clone()))?;

    let (front, body) = match split_front_matter(&content) {
        Some((yaml, body)) => (FrontMatter::parse(yaml, &path)?, body),
        None => {
            if content.trim_start_matches('\u{feff}').starts_with("---") {
                tracing::warn!(path = %path.display(), "unclosed front matter, reading as Markdown");
            }
            (FrontMatter::default(), content.as_str())
        }
    };
    let body = body.trim();

    let stem = Path::new(&entry.file.path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(entry.file.path.as_str());
    let stem_title = naming::parse_stem(stem).display_title;
    let heading = first_heading(body);
    let title = resolve(&[front.title.as_deref(), heading.as_deref(), Some(stem_title.as_str())])
        .unwrap_or_else(|| stem.to_string());

    let text = plain_text(body);
    let derived_description = truncate_chars(&text, settings.description_chars);
    let description =
        resolve(&[front.description.as_deref(), Some(derived_description.as_str())]).unwrap_or_default();

    let tags = if !front.tags.is_empty() {
        front.tags.clone()
    } else {
        let found = hashtags(&text);
        if found.is_empty() {
            settings.default_tags.clone()
        } else {
            found
        }
    };

    let image = resolve_image(&front, body, &title, assets, &path);
    let mut inline_images: Vec<ItemImage> = Vec::new();
    for reference in markdown_image_refs(body)
        .into_iter()
        .chain(html_image_refs(body))
    {
        if is_remote(&reference) {
            continue;
        }
        match assets.resolve_reference(&reference) {
            Some(found) if !inline_images.contains(&found) => inline_images.push(found),
            Some(_) => {}
            None => tracing::warn!(
                path = %path.display(),
                image = %reference,
                "inline image not found in assets"
            ),
        }
    }

    Ok(EditionItem {
        file: entry.file.clone(),
        change: entry.change,
        excerpt: truncate_chars(&text, settings.excerpt_chars),
        body: body.to_string(),
        url: resolve(&[front.url.as_deref()]),
        anchor: naming::anchor_id(stem),
        title,
        description,
        tags,
        image,
        inline_images,
    })
}

fn resolve_image(
    front: &FrontMatter,
    body: &str,
    title: &str,
    assets: &AssetIndex,
    path: &Path,
) -> Option<ItemImage> {
    let references = front.image.iter().cloned().chain(body_image_refs(body));
    for reference in references {
        match assets.resolve_reference(&reference) {
            Some(image) => return Some(image),
            None => tracing::warn!(
                path = %path.display(),
                image = %reference,
                "referenced image not found in assets"
            ),
        }
    }
    assets.match_slug(&naming::slugify(title))
}
