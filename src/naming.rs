//! Filename-derived names: display titles, slugs, and anchor ids.
//!
//! Portfolio documents are named freely (`my-project.md`, `Data_Viz.md`,
//! `010-first-steps.md`). When a document carries no title of its own, the
//! file stem is turned into one:
//!
//! - an optional `NNN-` ordering prefix is dropped
//! - dashes and underscores become spaces
//! - each word is capitalized, the rest lowercased
//!
//! ```text
//! my-project      → "My Project"
//! Data_Viz        → "Data Viz"
//! 010-first-steps → "First Steps"
//! ```

/// Result of parsing a file stem like `010-first-steps`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Ordering prefix if present (e.g., `10` from `010-first-steps`).
    pub number: Option<u32>,
    /// Stem with the prefix removed, separators preserved.
    pub name: String,
    /// Human title derived from `name`.
    pub display_title: String,
}

/// Parse a file stem, splitting off an optional `NNN-` prefix.
///
/// A stem that is only a number keeps it as the name, so `2024` stays a
/// usable title instead of becoming empty.
pub fn parse_stem(stem: &str) -> ParsedName {
    if let Some((prefix, rest)) = stem.split_once('-')
        && !rest.is_empty()
        && let Ok(num) = prefix.parse::<u32>()
    {
        return ParsedName {
            number: Some(num),
            name: rest.to_string(),
            display_title: title_case(rest),
        };
    }
    ParsedName {
        number: None,
        name: stem.to_string(),
        display_title: title_case(stem),
    }
}

/// Turn separators into spaces and capitalize each word.
pub fn title_case(raw: &str) -> String {
    raw.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Lowercase, dash-separated form used to match image files to titles.
///
/// `"Data Viz_2"` → `"data-viz-2"`. Characters other than ASCII
/// alphanumerics and non-ASCII letters collapse into single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Fragment id for an item, used by the table of contents.
pub fn anchor_id(stem: &str) -> String {
    format!("project-{}", slugify(stem))
}
