//! Self-update logic for `FireKiosk`, independent of UI and platform:
//! - Version parsing and ordering.
//! - Release feed queries.
//! - Update package downloads.

pub mod artifact;
mod http;
mod release;
pub mod version;

/// Update package download into the scratch file.
pub use artifact::{
    ArtifactError, DEFAULT_ARTIFACT_URL, DOWNLOAD_TIMEOUT, DownloadProgress, UpdateArtifact,
    download_artifact, remove_stale_artifact,
};
/// HTTP client construction shared by feed and download.
pub use http::{HttpOptions, MAX_REDIRECTS, http_client};
/// Latest-release model and feed queries.
pub use release::{
    DEFAULT_FEED_URL, FEED_TIMEOUT, FeedError, ReleaseInfo, check_for_update,
    fetch_latest_release,
};
/// Version identifiers and the "is newer" comparison.
pub use version::{VersionIdentifier, is_newer_version, strip_tag_prefix};
