use firekiosk_core::ReleaseInfo;

use crate::settings::Orientation;

/// A modal notice with a single acknowledge button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    UpToDate { current_version: String },
    CheckFailed { details: String },
    DownloadFailed { details: String },
    InstallFailed { details: String },
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Self::UpToDate { .. } => "No update",
            Self::CheckFailed { .. } => "Update check failed",
            Self::DownloadFailed { .. } => "Update failed",
            Self::InstallFailed { .. } => "Install failed",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Self::UpToDate { current_version } => {
                format!("You already have the latest version ({current_version}).")
            }
            Self::CheckFailed { details } => {
                format!("Could not check for updates. Is the internet available?\n\n{details}")
            }
            Self::DownloadFailed { details } => {
                format!("Could not download the update package.\n\n{details}")
            }
            Self::InstallFailed { details } => {
                format!("Could not start the installer.\n\n{details}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    ChangeUrl,
    Orientation,
    CheckForUpdates,
}

impl MenuItem {
    pub const ALL: [Self; 3] = [Self::ChangeUrl, Self::Orientation, Self::CheckForUpdates];

    pub fn label(self) -> &'static str {
        match self {
            Self::ChangeUrl => "Change URL",
            Self::Orientation => "Rotation / orientation",
            Self::CheckForUpdates => "Check for updates",
        }
    }
}

/// Everything the kiosk shows: dialogs, prompts, and the web surface.
///
/// Only ever called from the interactive thread. Answers to prompts come
/// back as messages, never as return values.
pub trait Presenter {
    fn show_notice(&mut self, notice: &Notice);

    /// Offer "install now" or "later" for `release`.
    fn prompt_install(&mut self, release: &ReleaseInfo);

    fn show_download_progress(&mut self, _downloaded: u64, _total: u64) {}

    fn show_status(&mut self, summary: &str);

    fn show_menu(&mut self, items: &[MenuItem]);

    fn show_orientation_choices(&mut self, current: Orientation);

    /// Ask for the URL to display; `initial` is set on first start.
    fn request_url(&mut self, initial: bool, current: &str);

    fn load_url(&mut self, url: &str);

    fn apply_orientation(&mut self, orientation: Orientation);
}
