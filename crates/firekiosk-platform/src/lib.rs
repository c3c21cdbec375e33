mod installer;
mod paths;

pub use installer::{
    ALLOW_UNKNOWN_SOURCES_KEY, Installer, InstallerError, PACKAGE_MIME_TYPE, SystemInstaller,
};
pub use paths::{AppPaths, AppPathsError, HOME_ENV_VAR};
