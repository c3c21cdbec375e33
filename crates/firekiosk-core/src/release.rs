use std::time::Duration;

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::version::{VersionIdentifier, is_newer_version, strip_tag_prefix};

pub const DEFAULT_FEED_URL: &str =
    "https://api.github.com/repos/hbtdul/FireTV-Kiosk/releases/latest";
pub const FEED_TIMEOUT: Duration = Duration::from_secs(8);

const RESPONSE_SNIPPET_CHARS: usize = 160;

/// The latest published release, as read from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Tag exactly as published, for example `v1.2`.
    pub tag: String,
    pub version: VersionIdentifier,
    pub release_url: Option<String>,
    pub release_notes: Option<String>,
}

impl ReleaseInfo {
    #[must_use]
    pub fn from_tag(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let version = VersionIdentifier::parse(strip_tag_prefix(&tag));
        Self {
            tag,
            version,
            release_url: None,
            release_notes: None,
        }
    }

    #[must_use]
    pub fn is_newer_than(&self, local_version: &str) -> bool {
        is_newer_version(strip_tag_prefix(&self.tag), local_version.trim())
    }
}

#[derive(Deserialize)]
struct LatestRelease {
    tag_name: String,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

impl From<LatestRelease> for ReleaseInfo {
    fn from(release: LatestRelease) -> Self {
        Self {
            release_url: release.html_url,
            release_notes: release.body,
            ..Self::from_tag(release.tag_name)
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("release feed request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("failed to query release feed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("release feed returned HTTP {status}{body_snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body_snippet: String,
    },
    #[error("failed to parse release feed response: {0}")]
    Parse(#[source] reqwest::Error),
}

impl FeedError {
    fn transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Request(error)
        }
    }

    fn body(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Parse(error)
        }
    }
}

/// Fetch the latest release published on the feed.
///
/// # Errors
/// Returns an error when the request fails or times out, the server answers
/// with a non-success status, or the body is not JSON with a `tag_name`.
pub async fn fetch_latest_release(
    client: &reqwest::Client,
    feed_url: &str,
) -> Result<ReleaseInfo, FeedError> {
    let response = client
        .get(feed_url)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .send()
        .await
        .map_err(FeedError::transport)?;

    if !response.status().is_success() {
        let status = response.status();
        let body_snippet = response
            .text()
            .await
            .ok()
            .map(|body| response_snippet(&body, RESPONSE_SNIPPET_CHARS))
            .unwrap_or_default();
        return Err(FeedError::HttpStatus {
            status,
            body_snippet,
        });
    }

    let release: LatestRelease = response.json().await.map_err(FeedError::body)?;
    debug!("Release feed reports tag {}", release.tag_name);
    Ok(release.into())
}

/// Check the feed for a release newer than `current_version`.
///
/// # Errors
/// Returns an error when the feed cannot be fetched or parsed.
pub async fn check_for_update(
    client: &reqwest::Client,
    feed_url: &str,
    current_version: &str,
) -> Result<Option<ReleaseInfo>, FeedError> {
    let release = fetch_latest_release(client, feed_url).await?;
    if release.is_newer_than(current_version) {
        Ok(Some(release))
    } else {
        Ok(None)
    }
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}
