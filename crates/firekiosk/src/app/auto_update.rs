//! Update package download and hand-off to the platform installer.
//!
//! Handles messages: `ConfirmInstall`, `DeferInstall`, `DownloadProgress`,
//! `ArtifactDownloaded`

use log::{debug, info, warn};
use tokio::sync::mpsc;

use firekiosk_core::{DownloadProgress, UpdateArtifact, download_artifact};
use firekiosk_platform::PACKAGE_MIME_TYPE;

use crate::error::AppError;
use crate::message::Message;
use crate::presenter::Notice;
use crate::state::UpdateState;

use super::Kiosk;

impl Kiosk {
    pub(super) fn handle_confirm_install(&mut self) {
        if self.update_state.is_downloading() {
            debug!("Install confirmed while a download is running; ignoring");
            return;
        }
        let Some(release) = self.offered_release.take() else {
            debug!("Install confirmed with no update on offer; ignoring");
            return;
        };

        info!("Installing update {}", release.tag);
        self.update_state = UpdateState::Downloading {
            release,
            downloaded: 0,
            total: 0,
        };

        let client = self.download_client.clone();
        let url = self.settings.artifact_url.clone();
        let dest = self.context.artifact_file.clone();

        self.runner.run(
            move |sender| async move {
                let (tx, mut rx) = mpsc::channel(32);

                let download_handle = tokio::spawn(async move {
                    download_artifact(&client, &url, &dest, Some(&tx)).await
                });

                while let Some(DownloadProgress { downloaded, total }) = rx.recv().await {
                    let _ = sender.send(Message::DownloadProgress { downloaded, total });
                }

                match download_handle.await {
                    Ok(result) => {
                        result.map_err(|error| AppError::auto_update_failed("download", error))
                    }
                    Err(error) => Err(AppError::auto_update_failed(
                        "task join",
                        format!("download task panicked: {error}"),
                    )),
                }
            },
            |result| Message::ArtifactDownloaded(Box::new(result)),
        );
    }

    pub(super) fn handle_defer_install(&mut self) {
        if let Some(release) = self.offered_release.take() {
            info!("Update {} deferred", release.tag);
        }
        if matches!(self.update_state, UpdateState::UpdateAvailable(_)) {
            self.update_state = UpdateState::Idle;
        }
    }

    pub(super) fn handle_download_progress(&mut self, downloaded: u64, total: u64) {
        if let UpdateState::Downloading {
            downloaded: current,
            total: expected,
            ..
        } = &mut self.update_state
        {
            *current = downloaded;
            *expected = total;
            self.presenter.show_download_progress(downloaded, total);
        }
    }

    pub(super) fn handle_artifact_downloaded(&mut self, result: Result<UpdateArtifact, AppError>) {
        match result {
            Ok(artifact) => {
                self.update_state = UpdateState::ReadyToInstall(artifact.clone());
                self.install_artifact(artifact);
            }
            Err(error) => {
                warn!("{error}");
                self.presenter.show_notice(&Notice::DownloadFailed {
                    details: error.details(),
                });
                self.update_state = UpdateState::DownloadFailed(error);
            }
        }
    }

    fn install_artifact(&mut self, artifact: UpdateArtifact) {
        if !self.installer.can_request_package_installs() {
            warn!("{}", AppError::InstallPermissionRequired);
            if let Err(error) = self.installer.open_permission_settings() {
                let error = AppError::auto_update_failed("permission request", error);
                warn!("{error}");
                let details = format!(
                    "{}. {}",
                    AppError::InstallPermissionRequired,
                    error.details()
                );
                self.presenter
                    .show_notice(&Notice::InstallFailed { details });
                self.update_state = UpdateState::InstallFailed(error);
                return;
            }
            self.update_state = UpdateState::PermissionRequired(artifact);
            return;
        }

        match self
            .installer
            .launch_installer(&artifact.path, PACKAGE_MIME_TYPE)
        {
            Ok(()) => {
                info!("Handed {} to the installer", artifact.path.display());
                self.update_state = UpdateState::HandedOff(artifact);
            }
            Err(error) => {
                let error = AppError::auto_update_failed("install", error);
                warn!("{error}");
                self.presenter.show_notice(&Notice::InstallFailed {
                    details: error.details(),
                });
                self.update_state = UpdateState::InstallFailed(error);
            }
        }
    }
}
