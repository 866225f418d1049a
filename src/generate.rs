//! HTML page generation.
//!
//! Stage 3 of the newsletter pipeline. Turns an [`Edition`] into a standalone
//! HTML document. Every function here is pure: data in, markup out. Writing
//! files is the job of [`publish`](crate::publish).
//!
//! ## Generated Pages
//!
//! - **Edition page** (`newsletters/newsletter_YYYYMMDD.html`): header, table
//!   of contents, summary cards, then the full text of every item
//! - **Archive page** (`newsletters/archives.html`): every edition, newest first
//! - **Redirect page** (`index.html`): forwards visitors to the latest edition
//!
//! ## Edition layout
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ header: site title, date, tagline        │  optional header image
//! ├──────────────────────────────────────────┤
//! │ table of contents → #project-<stem>      │
//! ├─────────────┬─────────────┬──────────────┤
//! │ card        │ card        │ card         │  image, description,
//! │             │             │              │  excerpt, tags
//! ├─────────────┴─────────────┴──────────────┤
//! │ #project-a: full Markdown body           │
//! │ #project-b: ...                          │
//! ├──────────────────────────────────────────┤
//! │ footer: links, archives, copyright       │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## CSS
//!
//! `static/newsletter.css` is embedded at compile time. The palette from
//! `[colors]` is prepended as CSS custom properties.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Page inputs are plain structs, so a missing field is a compile error, and
//! every interpolated value is escaped. Only the Markdown bodies are inserted
//! pre-rendered.

use crate::config::{self, ColorConfig, NewsletterConfig};
use crate::metadata;
use crate::types::{Edition, EditionItem};
use chrono::{Datelike, NaiveDate};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html as md_html};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("edition has no items")]
    EmptyEdition,
    #[error("two items share the anchor `{0}`")]
    DuplicateAnchor(String),
}

const CSS_STATIC: &str = include_str!("../static/newsletter.css");

/// Page the root redirect points at, relative to the publish root.
pub const LATEST_PATH: &str = "newsletters/latest.html";

/// An edition page ready to be written.
#[derive(Debug, Clone)]
pub struct RenderedEdition {
    pub file_name: String,
    pub html: String,
}

/// Everything the edition template shows.
#[derive(Debug)]
pub struct EditionPage<'a> {
    pub language: &'a str,
    pub site_title: &'a str,
    pub tagline: &'a str,
    pub display_date: String,
    pub year: i32,
    pub css: String,
    /// `src` of the header background, relative to the page.
    pub header_image: Option<String>,
    pub items: &'a [EditionItem],
    pub portfolio_url: Option<&'a str>,
    pub linkedin_url: Option<&'a str>,
}

impl<'a> EditionPage<'a> {
    pub fn new(
        edition: &'a Edition,
        config: &'a NewsletterConfig,
        header_image: Option<String>,
    ) -> Self {
        let site = &config.site;
        Self {
            language: &site.language,
            site_title: &site.title,
            tagline: &site.tagline,
            display_date: edition.display_date(),
            year: edition.published_at.year(),
            css: page_css(&config.colors),
            header_image,
            items: &edition.items,
            portfolio_url: config::non_empty(&site.portfolio_url),
            linkedin_url: config::non_empty(&site.linkedin_url),
        }
    }

    pub fn render(&self) -> Markup {
        let title = format!("{} - {}", self.site_title, self.display_date);
        let content = html! {
            div.container {
                (self.header())
                (table_of_contents(self.items))
                div.grid {
                    @for item in self.items {
                        (project_card(item))
                    }
                }
                @for item in self.items {
                    (project_detail(item))
                }
                (self.footer())
            }
        };
        base_document(self.language, &title, &self.css, content)
    }

    fn header(&self) -> Markup {
        let style = self
            .header_image
            .as_ref()
            .map(|src| format!("background-image: url('{src}');"));
        html! {
            header.header.with-image[style.is_some()] style=[style] {
                div.header-content {
                    h1 { (self.site_title) }
                    p.edition-date { (self.display_date) }
                    p.tagline { (self.tagline) }
                }
            }
        }
    }

    fn footer(&self) -> Markup {
        html! {
            footer.footer {
                h2 { "Restons connectés !" }
                div.social-links {
                    @if let Some(url) = self.portfolio_url {
                        a.social-link href=(url) target="_blank" rel="noopener" { "Portfolio" }
                    }
                    @if let Some(url) = self.linkedin_url {
                        a.social-link href=(url) target="_blank" rel="noopener" { "LinkedIn" }
                    }
                    a.social-link href="archives.html" { "Archives" }
                }
                p.copyright {
                    "© " (self.year) " - Newsletter générée automatiquement depuis mon portfolio"
                }
            }
        }
    }
}

/// Render an edition. Refuses empty editions and colliding anchors.
pub fn render_edition(
    edition: &Edition,
    config: &NewsletterConfig,
    header_image: Option<String>,
) -> Result<RenderedEdition, GenerateError> {
    if edition.is_empty() {
        return Err(GenerateError::EmptyEdition);
    }
    let mut anchors = HashSet::new();
    for item in &edition.items {
        if !anchors.insert(item.anchor.as_str()) {
            return Err(GenerateError::DuplicateAnchor(item.anchor.clone()));
        }
    }
    let page = EditionPage::new(edition, config, header_image);
    Ok(RenderedEdition {
        file_name: edition.file_name(),
        html: page.render().into_string(),
    })
}

fn page_css(colors: &ColorConfig) -> String {
    format!("{}\n\n{}", config::generate_color_css(colors), CSS_STATIC)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(lang: &str, title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(css)) }
            }
            body {
                (content)
            }
        }
    }
}

fn table_of_contents(items: &[EditionItem]) -> Markup {
    html! {
        nav.toc {
            div.toc-title { "Table des matières" }
            ul.toc-list {
                @for item in items {
                    li.toc-item { a href={ "#" (item.anchor) } { (item.title) } }
                }
            }
        }
    }
}

fn tag_list(tags: &[String]) -> Markup {
    html! {
        @if !tags.is_empty() {
            div.tags {
                @for tag in tags {
                    span.tag { (tag) }
                }
            }
        }
    }
}

fn project_card(item: &EditionItem) -> Markup {
    html! {
        article.project-card {
            @if let Some(image) = &item.image {
                div.project-image-container {
                    img.project-image src=(image.href()) alt=(item.title) loading="lazy";
                }
            }
            div.project-content {
                h2.project-title { (item.title) }
                div.project-description { (item.description) }
                div.project-summary { (item.excerpt) }
                (tag_list(&item.tags))
                a.btn href={ "#" (item.anchor) } { "En savoir plus" }
            }
        }
    }
}

fn project_detail(item: &EditionItem) -> Markup {
    html! {
        section.project-full-content id=(item.anchor) {
            h2 { (item.title) }
            @if let Some(image) = &item.image {
                img.hero-image src=(image.href()) alt=(item.title) loading="lazy";
            }
            (PreEscaped(markdown_to_html(&item.body)))
            (tag_list(&item.tags))
            @if let Some(url) = &item.url {
                a.btn href=(url) target="_blank" rel="noopener" { "Voir le projet" }
                " "
            }
            a.btn.back-to-top href="#" { "Retour en haut" }
        }
    }
}

/// Convert a Markdown body to HTML.
///
/// Local image destinations, in Markdown images and raw `<img>` tags alike,
/// are rewritten to `img/<file name>`, where the publisher copies them.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if !metadata::is_remote(&dest_url) => {
            let file_name = dest_url.rsplit(['/', '\\']).next().unwrap_or("");
            Event::Start(Tag::Image {
                link_type,
                dest_url: format!("img/{file_name}").into(),
                title,
                id,
            })
        }
        Event::Html(raw) => Event::Html(rewrite_html(&raw)),
        Event::InlineHtml(raw) => Event::InlineHtml(rewrite_html(&raw)),
        other => other,
    });
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

fn rewrite_html(raw: &str) -> CowStr<'static> {
    metadata::rewrite_html_image_srcs(raw).into_owned().into()
}

// ============================================================================
// Archive and redirect
// ============================================================================

/// One published edition found in the newsletters directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArchiveEntry {
    pub date: NaiveDate,
    pub file_name: String,
}

impl ArchiveEntry {
    /// Parse `newsletter_YYYYMMDD.html`. Other names yield `None`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let digits = name.strip_prefix("newsletter_")?.strip_suffix(".html")?;
        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let date = NaiveDate::parse_from_str(digits, "%Y%m%d").ok()?;
        Some(Self {
            date,
            file_name: name.to_string(),
        })
    }

    pub fn display_date(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }
}

/// Render the archive index. `entries` may come in any order.
pub fn render_archive(entries: &[ArchiveEntry], config: &NewsletterConfig) -> Markup {
    let mut sorted: Vec<&ArchiveEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.cmp(a));
    let site = &config.site;
    let title = format!("{} - Archives", site.title);

    let content = html! {
        div.container {
            header.header {
                div.header-content {
                    h1 { (site.title) }
                    p.tagline { "Archives des newsletters" }
                }
            }
            main.archive {
                @if sorted.is_empty() {
                    p { "Aucune newsletter publiée pour le moment." }
                } @else {
                    ul.archive-list {
                        @for (idx, entry) in sorted.iter().enumerate() {
                            li.archive-item {
                                a href=(entry.file_name) { "Newsletter du " (entry.display_date()) }
                                @if idx == 0 {
                                    " "
                                    span.tag { "dernière" }
                                }
                            }
                        }
                    }
                }
            }
            footer.footer {
                a.btn href="latest.html" { "Dernière newsletter" }
            }
        }
    };
    base_document(&site.language, &title, &page_css(&config.colors), content)
}

/// Render the root page forwarding to the latest edition.
pub fn render_redirect(target: &str) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="UTF-8";
                meta http-equiv="refresh" content={ "0; url=" (target) };
                link rel="canonical" href=(target);
                title { "Redirection" }
            }
            body {
                p { a href=(target) { "Dernière newsletter" } }
            }
        }
    }
}
