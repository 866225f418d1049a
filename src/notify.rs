//! Announcing a published edition.
//!
//! Stage 6 of the newsletter pipeline, after state is committed. A failure
//! here is logged by the caller and never undoes the publish.
//!
//! ## LinkedIn
//!
//! [`LinkedInNotifier`] shares a text post as `urn:li:person:<id>` through the
//! UGC posts API. Credentials come from the environment only:
//!
//! | Variable | Used for |
//! |---|---|
//! | `LINKEDIN_ACCESS_TOKEN` | Bearer token for the post |
//! | `LINKEDIN_PERSON_ID` | Post author |
//! | `LINKEDIN_CLIENT_ID`, `LINKEDIN_CLIENT_SECRET`, `LINKEDIN_REFRESH_TOKEN` | Token refresh |
//!
//! Without an access token, or when the post is rejected with 401, the token
//! is refreshed once and the post retried once.

use crate::config::NotifyConfig;
use crate::types::Edition;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use ureq::Agent;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("missing environment variable {0}")]
    MissingCredential(&'static str),
    #[error("HTTP error: {status} - {body}")]
    Http { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("token refresh failed: {0}")]
    Refresh(String),
}

impl From<ureq::Error> for NotifyError {
    fn from(e: ureq::Error) -> Self {
        NotifyError::Transport(e.to_string())
    }
}

/// Something that can announce a URL with a short text.
pub trait Notifier {
    fn notify(&self, url: &str, summary: &str) -> Result<(), NotifyError>;
}

// =============================================================================
// Summary text
// =============================================================================

/// Build the post text for an edition.
///
/// ```text
/// 🔥 Newsletter Portfolio - 23/03/2025 🔥
///
/// Découvrez mes derniers projets et réalisations cette semaine !
///
/// Projets inclus dans cette édition :
/// 1. Slowsia
/// 2. Data Viz
/// 3. Carnet
/// ...et 2 autres projets
///
/// Consultez la newsletter complète ici : https://…/newsletter_20250323.html
/// ```
pub fn compose_summary(
    edition: &Edition,
    site_title: &str,
    url: &str,
    settings: &NotifyConfig,
) -> String {
    let mut text = format!("🔥 {} - {} 🔥\n\n", site_title, edition.display_date());
    text.push_str("Découvrez mes derniers projets et réalisations cette semaine !\n\n");

    if !edition.items.is_empty() {
        text.push_str("Projets inclus dans cette édition :\n");
        for (idx, item) in edition
            .items
            .iter()
            .take(settings.max_projects_listed)
            .enumerate()
        {
            text.push_str(&format!("{}. {}\n", idx + 1, item.title));
        }
        let rest = edition
            .items
            .len()
            .saturating_sub(settings.max_projects_listed);
        if rest > 0 {
            let plural = if rest > 1 { "s" } else { "" };
            text.push_str(&format!("...et {rest} autre{plural} projet{plural}\n"));
        }
        text.push('\n');
    }
    text.push_str(&format!("Consultez la newsletter complète ici : {url}"));
    limit_chars(&text, settings.max_chars)
}

/// Cut to at most `max_chars` characters, ending in `...` when cut.
fn limit_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

// =============================================================================
// LinkedIn
// =============================================================================

const UGC_POSTS_URL: &str = "https://api.linkedin.com/v2/ugcPosts";
const TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Credentials read from `LINKEDIN_*` variables.
#[derive(Debug, Clone, Default)]
pub struct LinkedInCredentials {
    pub access_token: Option<String>,
    pub person_id: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

impl LinkedInCredentials {
    pub fn from_env() -> Result<Self, NotifyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NotifyError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let person_id =
            get("LINKEDIN_PERSON_ID").ok_or(NotifyError::MissingCredential("LINKEDIN_PERSON_ID"))?;
        let credentials = Self {
            access_token: get("LINKEDIN_ACCESS_TOKEN"),
            person_id,
            client_id: get("LINKEDIN_CLIENT_ID"),
            client_secret: get("LINKEDIN_CLIENT_SECRET"),
            refresh_token: get("LINKEDIN_REFRESH_TOKEN"),
        };
        if credentials.access_token.is_none() && !credentials.can_refresh() {
            return Err(NotifyError::MissingCredential("LINKEDIN_ACCESS_TOKEN"));
        }
        Ok(credentials)
    }

    pub fn can_refresh(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.refresh_token.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Posts edition announcements to a LinkedIn member feed.
pub struct LinkedInNotifier {
    agent: Agent,
    credentials: LinkedInCredentials,
    posts_url: String,
    token_url: String,
}

impl LinkedInNotifier {
    pub fn new(credentials: LinkedInCredentials) -> Self {
        Self::with_endpoints(credentials, UGC_POSTS_URL, TOKEN_URL)
    }

    /// Use other API endpoints (tests point these at a local server).
    pub fn with_endpoints(credentials: LinkedInCredentials, posts_url: &str, token_url: &str) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            credentials,
            posts_url: posts_url.to_string(),
            token_url: token_url.to_string(),
        }
    }

    fn refresh_token(&self) -> Result<String, NotifyError> {
        let creds = &self.credentials;
        let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
            creds.client_id.as_deref(),
            creds.client_secret.as_deref(),
            creds.refresh_token.as_deref(),
        ) else {
            return Err(NotifyError::Refresh(
                "LINKEDIN_CLIENT_ID, LINKEDIN_CLIENT_SECRET and LINKEDIN_REFRESH_TOKEN are required"
                    .into(),
            ));
        };
        let basic = STANDARD.encode(format!("{client_id}:{client_secret}"));

        tracing::info!("refreshing LinkedIn access token");
        let response = self
            .agent
            .post(&self.token_url)
            .header("Authorization", &format!("Basic {basic}"))
            .send_form([
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])?;

        let status = response.status().as_u16();
        let mut body = response.into_body();
        if status != 200 {
            let text = body
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_string());
            return Err(NotifyError::Refresh(format!("{status} - {text}")));
        }
        let token: TokenResponse = body
            .read_json()
            .map_err(|e| NotifyError::Refresh(e.to_string()))?;
        Ok(token.access_token)
    }

    /// Post once. Returns the HTTP status and body.
    fn post(&self, token: &str, payload: &serde_json::Value) -> Result<(u16, String), NotifyError> {
        let response = self
            .agent
            .post(&self.posts_url)
            .header("Authorization", &format!("Bearer {token}"))
            .header("X-Restli-Protocol-Version", "2.0.0")
            .send_json(payload)?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read body)".to_string());
        Ok((status, body))
    }
}

/// JSON body of a public text share.
pub fn ugc_payload(person_id: &str, text: &str) -> serde_json::Value {
    json!({
        "author": format!("urn:li:person:{person_id}"),
        "lifecycleState": "PUBLISHED",
        "specificContent": {
            "com.linkedin.ugc.ShareContent": {
                "shareCommentary": { "text": text },
                "shareMediaCategory": "NONE"
            }
        },
        "visibility": {
            "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
        }
    })
}

fn is_success(status: u16) -> bool {
    status == 200 || status == 201
}

impl Notifier for LinkedInNotifier {
    fn notify(&self, url: &str, summary: &str) -> Result<(), NotifyError> {
        let payload = ugc_payload(&self.credentials.person_id, summary);
        let mut refreshed = false;
        let mut token = match &self.credentials.access_token {
            Some(token) => token.clone(),
            None => {
                refreshed = true;
                self.refresh_token()?
            }
        };

        let (mut status, mut body) = self.post(&token, &payload)?;
        if status == 401 && !refreshed {
            tracing::info!("LinkedIn token rejected, retrying with a fresh one");
            token = self.refresh_token()?;
            (status, body) = self.post(&token, &payload)?;
        }
        if !is_success(status) {
            return Err(NotifyError::Http { status, body });
        }
        tracing::info!(url = %url, "posted edition to LinkedIn");
        Ok(())
    }
}
