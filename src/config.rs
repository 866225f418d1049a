//! Newsletter configuration.
//!
//! Handles loading, validating, and merging `newsletter.toml`. Stock defaults
//! are serialized to a TOML table and the user file is merged on top of it,
//! so a config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_dir = "docs"        # Markdown sources, relative to the portfolio
//! assets_dir = "img"          # Images, relative to the portfolio
//!
//! [selection]
//! max_items = 6               # Items per edition
//! window_days = 7             # Look-back window; 0 disables it
//!
//! [content]
//! description_chars = 150     # Fallback description length
//! excerpt_chars = 250         # Card excerpt length
//! default_tags = ["portfolio"]
//!
//! [site]
//! title = "Newsletter Portfolio"
//! tagline = "Découvrez mes derniers projets et réalisations !"
//! language = "fr"
//! portfolio_url = ""
//! linkedin_url = ""
//! public_url = ""             # Base URL of the published site
//! header_image = ""           # File in assets_dir used as header background
//!
//! [colors]
//! primary = "#4a6d8c"
//! secondary = "#2a475e"
//! accent = "#90afc5"
//! background = "#f6f9fc"
//! text = "#444444"
//!
//! [publish]
//! cname = ""                  # Custom domain written to CNAME
//!
//! [notify]
//! linkedin = false
//! max_projects_listed = 3
//! max_chars = 3000
//! ```
//!
//! Unknown keys are rejected to catch typos early. Empty strings mean
//! "not set" for the optional URL and name fields.
//!
//! LinkedIn credentials are read from the environment by
//! [`notify`](crate::notify), never from this file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Newsletter configuration loaded from `newsletter.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewsletterConfig {
    /// Markdown sources, relative to the portfolio root.
    pub content_dir: String,
    /// Image directory, relative to the portfolio root.
    pub assets_dir: String,
    pub selection: SelectionConfig,
    pub content: ContentConfig,
    pub site: SiteConfig,
    pub colors: ColorConfig,
    pub publish: PublishConfig,
    pub notify: NotifyConfig,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            content_dir: "docs".to_string(),
            assets_dir: "img".to_string(),
            selection: SelectionConfig::default(),
            content: ContentConfig::default(),
            site: SiteConfig::default(),
            colors: ColorConfig::default(),
            publish: PublishConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl NewsletterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.selection.max_items == 0 {
            return Err(ConfigError::Validation(
                "selection.max_items must be at least 1".into(),
            ));
        }
        if self.content.excerpt_chars == 0 || self.content.description_chars == 0 {
            return Err(ConfigError::Validation(
                "content.excerpt_chars and content.description_chars must be non-zero".into(),
            ));
        }
        if self.content_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "content_dir must not be empty".into(),
            ));
        }
        if self.notify.max_chars < 200 {
            return Err(ConfigError::Validation(
                "notify.max_chars must be at least 200".into(),
            ));
        }
        let public_url = self.site.public_url.trim();
        if !public_url.is_empty()
            && !(public_url.starts_with("https://") || public_url.starts_with("http://"))
        {
            return Err(ConfigError::Validation(
                "site.public_url must be an http(s) URL".into(),
            ));
        }
        Ok(())
    }
}

/// Delta selection policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// Maximum number of items in one edition.
    pub max_items: usize,
    /// Files older than this many days at run time are not eligible.
    /// `0` disables the window.
    pub window_days: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_items: 6,
            window_days: 7,
        }
    }
}

/// Metadata fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Length of the description derived from the body when front matter has none.
    pub description_chars: usize,
    /// Length of the plain-text excerpt shown on item cards.
    pub excerpt_chars: usize,
    /// Tags used when neither front matter nor hashtags provide any.
    pub default_tags: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            description_chars: 150,
            excerpt_chars: 250,
            default_tags: vec!["portfolio".to_string()],
        }
    }
}

/// Page identity and outbound links.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub title: String,
    pub tagline: String,
    /// `lang` attribute of generated pages.
    pub language: String,
    pub portfolio_url: String,
    pub linkedin_url: String,
    /// Base URL the publish directory is served from.
    pub public_url: String,
    /// File name inside the assets dir used as header background.
    pub header_image: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Newsletter Portfolio".to_string(),
            tagline: "Découvrez mes derniers projets et réalisations !".to_string(),
            language: "fr".to_string(),
            portfolio_url: String::new(),
            linkedin_url: String::new(),
            public_url: String::new(),
            header_image: String::new(),
        }
    }
}

impl SiteConfig {
    /// Public URL of an edition file, if the site URL is configured.
    pub fn edition_url(&self, file_name: &str) -> Option<String> {
        let base = self.public_url.trim().trim_end_matches('/');
        if base.is_empty() {
            None
        } else {
            Some(format!("{base}/newsletters/{file_name}"))
        }
    }

    pub fn header_image(&self) -> Option<&str> {
        non_empty(&self.header_image)
    }
}

/// Palette of the generated pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "#4a6d8c".to_string(),
            secondary: "#2a475e".to_string(),
            accent: "#90afc5".to_string(),
            background: "#f6f9fc".to_string(),
            text: "#444444".to_string(),
        }
    }
}

/// Publish directory extras.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Custom domain written to `CNAME`.
    pub cname: String,
}

impl PublishConfig {
    pub fn cname(&self) -> Option<&str> {
        non_empty(&self.cname)
    }
}

/// Cross-post settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// Post a summary to LinkedIn after publishing.
    pub linkedin: bool,
    /// Item titles listed in the summary before "...and N more".
    pub max_projects_listed: usize,
    /// Hard length limit of the summary text.
    pub max_chars: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            linkedin: false,
            max_projects_listed: 3,
            max_chars: 3000,
        }
    }
}

/// Trimmed value, or `None` when blank.
pub(crate) fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(NewsletterConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<NewsletterConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: NewsletterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `newsletter.toml` from `path`, falling back to stock defaults.
pub fn load_config(path: &Path) -> Result<NewsletterConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `newsletter.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Portfolio Digest Configuration
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Markdown sources and images, relative to the portfolio directory.
content_dir = "docs"
assets_dir = "img"

# ---------------------------------------------------------------------------
# Selection
# ---------------------------------------------------------------------------
[selection]
# Maximum number of items in one edition.
max_items = 6

# Only files modified within this many days of the run are eligible.
# 0 disables the window.
window_days = 7

# ---------------------------------------------------------------------------
# Content fallbacks
# ---------------------------------------------------------------------------
[content]
# Length of the description derived from the body when front matter has none.
description_chars = 150

# Length of the plain-text excerpt shown on item cards.
excerpt_chars = 250

# Tags used when neither front matter nor #hashtags provide any.
default_tags = ["portfolio"]

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
title = "Newsletter Portfolio"
tagline = "Découvrez mes derniers projets et réalisations !"
language = "fr"

# Footer links. Empty = hidden.
portfolio_url = ""
linkedin_url = ""

# Base URL the publish directory is served from, e.g.
# "https://someone.github.io/portfolio-newsletter". Needed for notifications.
public_url = ""

# Image in assets_dir used as the header background. Empty = plain header.
header_image = ""

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[colors]
primary = "#4a6d8c"
secondary = "#2a475e"
accent = "#90afc5"
background = "#f6f9fc"
text = "#444444"

# ---------------------------------------------------------------------------
# Publishing
# ---------------------------------------------------------------------------
[publish]
# Custom domain written to CNAME. Empty = no CNAME file.
cname = ""

# ---------------------------------------------------------------------------
# Notification
# ---------------------------------------------------------------------------
[notify]
# Post a summary to LinkedIn after publishing. Credentials come from
# LINKEDIN_ACCESS_TOKEN / LINKEDIN_CLIENT_ID / LINKEDIN_CLIENT_SECRET /
# LINKEDIN_REFRESH_TOKEN / LINKEDIN_PERSON_ID.
linkedin = false

# Item titles listed in the summary before "...and N more".
max_projects_listed = 3

# Hard length limit of the summary text.
max_chars = 3000
"##
}

/// Generate CSS custom properties from the palette.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --primary: {primary};
    --secondary: {secondary};
    --accent: {accent};
    --light: {background};
    --text: {text};
}}"#,
        primary = colors.primary,
        secondary = colors.secondary,
        accent = colors.accent,
        background = colors.background,
        text = colors.text,
    )
}
