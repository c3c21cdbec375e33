mod async_helpers;
mod auto_update;
mod menu;
mod update_checks;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use log::{debug, info, warn};

use firekiosk_core::{HttpOptions, ReleaseInfo, http_client, remove_stale_artifact};
use firekiosk_platform::{AppPaths, Installer};

use crate::error::AppError;
use crate::message::Message;
use crate::presenter::Presenter;
use crate::settings::{DEFAULT_URL, KioskSettings, normalize_url};
use crate::state::UpdateState;

pub use async_helpers::TaskRunner;

/// Where the kiosk keeps its files, and which version it is running.
#[derive(Debug, Clone)]
pub struct KioskContext {
    pub current_version: String,
    pub settings_file: PathBuf,
    pub artifact_file: PathBuf,
}

impl KioskContext {
    pub fn from_paths(paths: &AppPaths) -> Self {
        Self {
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            settings_file: paths.settings_file(),
            artifact_file: paths.update_artifact_file(),
        }
    }
}

pub struct Kiosk {
    pub(crate) settings: KioskSettings,
    pub(crate) context: KioskContext,
    pub(crate) update_state: UpdateState,
    /// Release most recently offered and not yet accepted or declined.
    pub(crate) offered_release: Option<ReleaseInfo>,
    pub(crate) initial_url_pending: bool,
    pub(crate) feed_client: reqwest::Client,
    pub(crate) download_client: reqwest::Client,
    pub(crate) presenter: Box<dyn Presenter>,
    pub(crate) installer: Arc<dyn Installer>,
    pub(crate) runner: TaskRunner,
    exit_requested: bool,
}

impl Kiosk {
    /// # Errors
    /// Returns an error when an HTTP client cannot be built.
    pub fn new(
        settings: KioskSettings,
        context: KioskContext,
        presenter: Box<dyn Presenter>,
        installer: Arc<dyn Installer>,
        runner: TaskRunner,
    ) -> Result<Self, reqwest::Error> {
        let feed_client = http_client(&HttpOptions::feed(
            Duration::from_secs(settings.feed_timeout_secs),
            settings.require_https,
        ))?;
        let download_client = http_client(&HttpOptions::download(
            Duration::from_secs(settings.download_timeout_secs),
            settings.require_https,
        ))?;

        Ok(Self {
            settings,
            context,
            update_state: UpdateState::Idle,
            offered_release: None,
            initial_url_pending: false,
            feed_client,
            download_client,
            presenter,
            installer,
            runner,
            exit_requested: false,
        })
    }

    /// Bring up the web surface and kick off the startup update check.
    pub fn boot(&mut self) {
        remove_stale_artifact(&self.context.artifact_file);
        self.presenter.apply_orientation(self.settings.orientation);

        if let Some(url) = self.settings.saved_url().map(normalize_url) {
            self.presenter.load_url(&url);
        } else {
            info!("No saved URL, asking for one");
            self.initial_url_pending = true;
            self.presenter.request_url(true, DEFAULT_URL);
        }

        if self.settings.check_on_startup {
            self.handle_check_for_update(true);
        }
    }

    pub fn update(&mut self, message: Message) {
        match message {
            Message::OpenMenu => self.handle_open_menu(),
            Message::ShowStatus => {
                let summary = self.update_state.summary();
                self.presenter.show_status(&summary);
            }
            Message::MenuItemSelected(item) => self.handle_menu_item_selected(item),
            Message::UrlEntered(url) => self.handle_url_entered(&url),
            Message::UrlEntryCancelled => self.handle_url_entry_cancelled(),
            Message::OrientationSelected(orientation) => {
                self.handle_orientation_selected(orientation);
            }
            Message::CheckForUpdate { silent } => self.handle_check_for_update(silent),
            Message::UpdateChecked { silent, result } => {
                self.handle_update_checked(silent, *result);
            }
            Message::ConfirmInstall => self.handle_confirm_install(),
            Message::DeferInstall => self.handle_defer_install(),
            Message::DownloadProgress { downloaded, total } => {
                self.handle_download_progress(downloaded, total);
            }
            Message::ArtifactDownloaded(result) => self.handle_artifact_downloaded(*result),
            Message::Quit => {
                info!("Quit requested");
                self.exit_requested = true;
            }
        }
    }

    /// Drain messages until `Quit` arrives or every sender is gone.
    pub fn run(&mut self, receiver: &Receiver<Message>) {
        while !self.exit_requested {
            let Ok(message) = receiver.recv() else {
                debug!("Message channel closed");
                break;
            };
            self.update(message);
        }
    }

    pub(crate) fn persist_settings(&mut self) {
        let path = &self.context.settings_file;
        // The install grant is edited by hand; never clobber it from memory.
        self.settings.allow_unknown_sources =
            KioskSettings::load_from(path).allow_unknown_sources;

        if let Err(error) = self.settings.save_to(path) {
            warn!("{}", AppError::settings_save_failed(error));
        }
    }
}
