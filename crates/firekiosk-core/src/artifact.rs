use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// Stable download location that always redirects to the newest package.
pub const DEFAULT_ARTIFACT_URL: &str =
    "https://github.com/hbtdul/FireTV-Kiosk/releases/latest/download/firekiosk.apk";
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    /// Announced size in bytes, `0` when the server sent no length.
    pub total: u64,
}

/// A fully downloaded update package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateArtifact {
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{context}: timed out ({source})")]
    Timeout {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("download failed with HTTP {status}")]
    HttpStatus { status: reqwest::StatusCode },
    #[error("download incomplete: received {received} of {expected} bytes")]
    Incomplete { expected: u64, received: u64 },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    fn http(context: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { context, source }
        } else {
            Self::Http { context, source }
        }
    }

    fn io_with_path(context: &'static str, path: &Path, source: &std::io::Error) -> Self {
        Self::Io {
            context,
            source: std::io::Error::new(source.kind(), format!("{}: {source}", path.display())),
        }
    }
}

/// Download the update package at `url` into `dest`.
///
/// `dest` is truncated before the first byte is written and removed again if
/// the transfer fails, so a later attempt never sees bytes from this one.
///
/// # Errors
/// Returns an error when the request fails or times out, the server answers
/// with a non-success status, the body ends early, or the file cannot be
/// written.
pub async fn download_artifact(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress: Option<&mpsc::Sender<DownloadProgress>>,
) -> Result<UpdateArtifact, ArtifactError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|error| {
            ArtifactError::io_with_path("failed to create download directory", parent, &error)
        })?;
    }

    info!("Downloading update from {url}");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| ArtifactError::http("download request failed", error))?;

    if !response.status().is_success() {
        return Err(ArtifactError::HttpStatus {
            status: response.status(),
        });
    }
    debug!("Download resolved to {}", response.url());

    let result = write_body(response, dest, progress).await;
    if let Err(error) = &result {
        warn!("Update download failed, discarding {}: {error}", dest.display());
        if let Err(remove_error) = tokio::fs::remove_file(dest).await
            && remove_error.kind() != std::io::ErrorKind::NotFound
        {
            warn!(
                "Failed to remove partial download {}: {remove_error}",
                dest.display()
            );
        }
    }
    result
}

async fn write_body(
    response: reqwest::Response,
    dest: &Path,
    progress: Option<&mpsc::Sender<DownloadProgress>>,
) -> Result<UpdateArtifact, ArtifactError> {
    use futures_util::StreamExt;

    let expected = response.content_length();
    let total = expected.unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut hasher = Sha256::new();

    let mut file = tokio::fs::File::create(dest).await.map_err(|error| {
        ArtifactError::io_with_path("failed to create download file", dest, &error)
    })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| ArtifactError::http("download stream error", error))?;
        file.write_all(&chunk).await.map_err(|error| {
            ArtifactError::io_with_path("failed to write download data", dest, &error)
        })?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
        if let Some(progress) = progress {
            let _ = progress
                .send(DownloadProgress { downloaded, total })
                .await;
        }
    }

    file.flush().await.map_err(|error| {
        ArtifactError::io_with_path("failed to flush download file", dest, &error)
    })?;
    file.sync_all().await.map_err(|error| {
        ArtifactError::io_with_path("failed to sync download file", dest, &error)
    })?;
    drop(file);

    if let Some(expected) = expected
        && expected != downloaded
    {
        return Err(ArtifactError::Incomplete {
            expected,
            received: downloaded,
        });
    }

    let sha256 = format!("{:x}", hasher.finalize());
    info!("Download complete: {downloaded} bytes, sha256 {sha256}");
    Ok(UpdateArtifact {
        path: dest.to_path_buf(),
        size: downloaded,
        sha256,
    })
}

/// Delete an artifact left behind by a previous run.
pub fn remove_stale_artifact(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed stale update artifact {}", path.display()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => warn!(
            "Failed to remove stale update artifact {}: {error}",
            path.display()
        ),
    }
}
