//! Release feed checks, both the silent startup one and user-requested ones.
//!
//! Handles messages: `CheckForUpdate`, `UpdateChecked`

use chrono::Utc;
use log::{debug, info, warn};

use firekiosk_core::{ReleaseInfo, check_for_update};

use crate::error::AppError;
use crate::message::Message;
use crate::presenter::Notice;
use crate::state::UpdateState;

use super::Kiosk;

impl Kiosk {
    pub(super) fn handle_check_for_update(&mut self, silent: bool) {
        info!("Checking for updates (silent: {silent})");
        if !self.update_state.is_downloading() {
            self.update_state = UpdateState::Checking;
        }

        let client = self.feed_client.clone();
        let feed_url = self.settings.feed_url.clone();
        let current_version = self.context.current_version.clone();

        self.runner.perform(
            async move {
                check_for_update(&client, &feed_url, &current_version)
                    .await
                    .map_err(AppError::update_check_failed)
            },
            move |result| Message::UpdateChecked {
                silent,
                result: Box::new(result),
            },
        );
    }

    pub(super) fn handle_update_checked(
        &mut self,
        silent: bool,
        result: Result<Option<ReleaseInfo>, AppError>,
    ) {
        let downloading = self.update_state.is_downloading();

        match result {
            Ok(Some(release)) => {
                self.record_update_check();
                if downloading {
                    debug!(
                        "Update {} reported while a download is running",
                        release.tag
                    );
                    return;
                }
                info!(
                    "Update available: {} (running {})",
                    release.tag, self.context.current_version
                );
                self.presenter.prompt_install(&release);
                self.offered_release = Some(release.clone());
                self.update_state = UpdateState::UpdateAvailable(release);
            }
            Ok(None) => {
                self.record_update_check();
                info!("Already on the latest version ({})", self.context.current_version);
                if !silent {
                    self.presenter.show_notice(&Notice::UpToDate {
                        current_version: self.context.current_version.clone(),
                    });
                }
                if !downloading {
                    self.update_state = UpdateState::UpToDate;
                }
            }
            Err(error) => {
                warn!("{error}");
                if !silent {
                    self.presenter.show_notice(&Notice::CheckFailed {
                        details: error.details(),
                    });
                }
                if !downloading {
                    self.update_state = UpdateState::CheckFailed(error);
                }
            }
        }
    }

    fn record_update_check(&mut self) {
        self.settings.last_update_check = Some(Utc::now());
        self.persist_settings();
    }
}
