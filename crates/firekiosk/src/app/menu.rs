//! Options menu: displayed URL, orientation, manual update checks.
//!
//! Handles messages: `OpenMenu`, `MenuItemSelected`, `UrlEntered`,
//! `UrlEntryCancelled`, `OrientationSelected`

use log::{debug, info};

use crate::presenter::MenuItem;
use crate::settings::{DEFAULT_URL, Orientation, normalize_url};

use super::Kiosk;

impl Kiosk {
    pub(super) fn handle_open_menu(&mut self) {
        self.presenter.show_menu(&MenuItem::ALL);
    }

    pub(super) fn handle_menu_item_selected(&mut self, item: MenuItem) {
        debug!("Menu item selected: {}", item.label());
        match item {
            MenuItem::ChangeUrl => {
                let current = self.current_url();
                self.presenter.request_url(false, &current);
            }
            MenuItem::Orientation => {
                self.presenter
                    .show_orientation_choices(self.settings.orientation);
            }
            MenuItem::CheckForUpdates => self.handle_check_for_update(false),
        }
    }

    pub(super) fn handle_url_entered(&mut self, input: &str) {
        if input.trim().is_empty() {
            let current = self.current_url();
            self.presenter.request_url(self.initial_url_pending, &current);
            return;
        }
        self.initial_url_pending = false;
        self.show_url(&normalize_url(input));
    }

    pub(super) fn handle_url_entry_cancelled(&mut self) {
        if self.initial_url_pending {
            self.initial_url_pending = false;
            self.show_url(DEFAULT_URL);
        }
    }

    pub(super) fn handle_orientation_selected(&mut self, orientation: Orientation) {
        info!("Orientation set to {}", orientation.as_str());
        self.settings.orientation = orientation;
        self.persist_settings();
        self.presenter.apply_orientation(orientation);
    }

    fn show_url(&mut self, url: &str) {
        info!("Showing {url}");
        self.settings.last_url = Some(url.to_string());
        self.persist_settings();
        self.presenter.load_url(url);
    }

    fn current_url(&self) -> String {
        self.settings.saved_url().unwrap_or(DEFAULT_URL).to_string()
    }
}
