use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_URL: &str = "https://example.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KioskSettings {
    #[serde(default)]
    pub last_url: Option<String>,

    #[serde(default, rename = "orientation_mode")]
    pub orientation: Orientation,

    #[serde(default = "default_true")]
    pub check_on_startup: bool,

    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    #[serde(default = "default_artifact_url")]
    pub artifact_url: String,

    #[serde(default = "default_feed_timeout")]
    pub feed_timeout_secs: u64,

    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub require_https: bool,

    #[serde(default)]
    pub allow_unknown_sources: bool,

    #[serde(default)]
    pub last_update_check: Option<DateTime<Utc>>,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_true() -> bool {
    true
}

fn default_feed_url() -> String {
    firekiosk_core::DEFAULT_FEED_URL.to_string()
}

fn default_artifact_url() -> String {
    firekiosk_core::DEFAULT_ARTIFACT_URL.to_string()
}

fn default_feed_timeout() -> u64 {
    firekiosk_core::FEED_TIMEOUT.as_secs()
}

fn default_download_timeout() -> u64 {
    firekiosk_core::DOWNLOAD_TIMEOUT.as_secs()
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for KioskSettings {
    fn default() -> Self {
        Self {
            last_url: None,
            orientation: Orientation::Auto,
            check_on_startup: true,
            feed_url: default_feed_url(),
            artifact_url: default_artifact_url(),
            feed_timeout_secs: default_feed_timeout(),
            download_timeout_secs: default_download_timeout(),
            require_https: true,
            allow_unknown_sources: false,
            last_update_check: None,
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl KioskSettings {
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                log::warn!("Ignoring unreadable settings {}: {error}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
    }

    /// Saved URL, or `None` when it is missing or blank.
    pub fn saved_url(&self) -> Option<&str> {
        self.last_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Add `https://` unless the input already names an HTTP(S) scheme.
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Auto,
    Landscape,
    Portrait,
    ReverseLandscape,
    ReversePortrait,
}

impl Orientation {
    pub const ALL: [Self; 5] = [
        Self::Auto,
        Self::Landscape,
        Self::Portrait,
        Self::ReverseLandscape,
        Self::ReversePortrait,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::ReverseLandscape => "reverse_landscape",
            Self::ReversePortrait => "reverse_portrait",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Auto => "Auto (default)",
            Self::Landscape => "Landscape",
            Self::Portrait => "Portrait",
            Self::ReverseLandscape => "Reverse landscape",
            Self::ReversePortrait => "Reverse portrait",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|orientation| orientation.as_str() == name.trim())
    }
}

impl<'de> Deserialize<'de> for Orientation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_name(&raw).unwrap_or_default())
    }
}
