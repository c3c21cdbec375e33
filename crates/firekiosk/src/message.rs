use firekiosk_core::{ReleaseInfo, UpdateArtifact};

use crate::error::AppError;
use crate::presenter::MenuItem;
use crate::settings::Orientation;

#[derive(Debug, Clone)]
pub enum Message {
    OpenMenu,
    ShowStatus,
    MenuItemSelected(MenuItem),

    UrlEntered(String),
    UrlEntryCancelled,
    OrientationSelected(Orientation),

    CheckForUpdate {
        silent: bool,
    },
    UpdateChecked {
        silent: bool,
        result: Box<Result<Option<ReleaseInfo>, AppError>>,
    },
    ConfirmInstall,
    DeferInstall,
    DownloadProgress {
        downloaded: u64,
        total: u64,
    },
    ArtifactDownloaded(Box<Result<UpdateArtifact, AppError>>),

    Quit,
}
