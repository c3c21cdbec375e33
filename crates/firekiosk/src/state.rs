use firekiosk_core::{ReleaseInfo, UpdateArtifact};

use crate::error::AppError;

/// Where the self-update flow currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UpdateState {
    #[default]
    Idle,
    Checking,
    UpToDate,
    CheckFailed(AppError),
    UpdateAvailable(ReleaseInfo),
    Downloading {
        release: ReleaseInfo,
        downloaded: u64,
        total: u64,
    },
    ReadyToInstall(UpdateArtifact),
    DownloadFailed(AppError),
    PermissionRequired(UpdateArtifact),
    InstallFailed(AppError),
    HandedOff(UpdateArtifact),
}

impl UpdateState {
    /// A download has been started and has not finished yet.
    pub fn is_downloading(&self) -> bool {
        matches!(self, Self::Downloading { .. })
    }

    /// One line for the status readout.
    pub fn summary(&self) -> String {
        match self {
            Self::Idle => "No update activity".to_string(),
            Self::Checking => "Checking for updates".to_string(),
            Self::UpToDate => "Up to date".to_string(),
            Self::CheckFailed(error) | Self::DownloadFailed(error) | Self::InstallFailed(error) => {
                error.to_string()
            }
            Self::UpdateAvailable(release) => format!("Version {} is available", release.tag),
            Self::Downloading {
                release,
                downloaded,
                total,
            } => {
                if *total > 0 {
                    format!("Downloading {}: {downloaded} of {total} bytes", release.tag)
                } else {
                    format!("Downloading {}: {downloaded} bytes", release.tag)
                }
            }
            Self::ReadyToInstall(artifact) => {
                format!("Downloaded {} bytes to {}", artifact.size, artifact.path.display())
            }
            Self::PermissionRequired(artifact) => format!(
                "{} is waiting for permission to install",
                artifact.path.display()
            ),
            Self::HandedOff(artifact) => format!(
                "Handed {} (sha256 {}) to the installer",
                artifact.path.display(),
                artifact.sha256
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use firekiosk_core::ReleaseInfo;

    use super::UpdateState;
    use crate::error::AppError;

    #[test]
    fn downloading_is_detected() {
        let state = UpdateState::Downloading {
            release: ReleaseInfo::from_tag("v2.0"),
            downloaded: 0,
            total: 0,
        };

        assert!(state.is_downloading());
        assert!(!UpdateState::Checking.is_downloading());
        assert!(!UpdateState::UpdateAvailable(ReleaseInfo::from_tag("v2.0")).is_downloading());
    }

    #[test]
    fn summary_names_release_and_progress() {
        let known_size = UpdateState::Downloading {
            release: ReleaseInfo::from_tag("v2.0"),
            downloaded: 512,
            total: 2048,
        };
        let unknown_size = UpdateState::Downloading {
            release: ReleaseInfo::from_tag("v2.0"),
            downloaded: 512,
            total: 0,
        };

        assert_eq!(known_size.summary(), "Downloading v2.0: 512 of 2048 bytes");
        assert_eq!(unknown_size.summary(), "Downloading v2.0: 512 bytes");
        assert_eq!(
            UpdateState::CheckFailed(AppError::update_check_failed("HTTP 500")).summary(),
            "Update check failed: HTTP 500"
        );
    }
}
