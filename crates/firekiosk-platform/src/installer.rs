use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

/// MIME type declared for update packages handed to the installer.
pub const PACKAGE_MIME_TYPE: &str = "application/vnd.android.package-archive";

/// Settings key that grants installing packages from outside a store.
pub const ALLOW_UNKNOWN_SOURCES_KEY: &str = "allow_unknown_sources";

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("update package not found at {}", path.display())]
    MissingPackage { path: PathBuf },
    #[error("failed to open {}: {source}", target.display())]
    Open {
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The platform's package installer.
pub trait Installer: Send + Sync {
    /// Whether packages from this source may be installed right now.
    fn can_request_package_installs(&self) -> bool;

    /// Send the user to where the install permission can be granted.
    ///
    /// # Errors
    /// Returns an error when the permission surface cannot be opened.
    fn open_permission_settings(&self) -> Result<(), InstallerError>;

    /// Hand `package` to the system installer UI.
    ///
    /// # Errors
    /// Returns an error when the package is missing or the installer cannot
    /// be launched.
    fn launch_installer(&self, package: &Path, mime_type: &str) -> Result<(), InstallerError>;
}

/// Desktop installer backed by the system's default opener.
///
/// The install permission lives in the settings file under
/// [`ALLOW_UNKNOWN_SOURCES_KEY`] and is re-read on every query, so granting
/// it takes effect without a restart.
#[derive(Debug, Clone)]
pub struct SystemInstaller {
    settings_file: PathBuf,
}

impl SystemInstaller {
    #[must_use]
    pub fn new(settings_file: PathBuf) -> Self {
        Self { settings_file }
    }
}

impl Installer for SystemInstaller {
    fn can_request_package_installs(&self) -> bool {
        allow_unknown_sources(&self.settings_file)
    }

    fn open_permission_settings(&self) -> Result<(), InstallerError> {
        info!(
            "Opening {} to grant {ALLOW_UNKNOWN_SOURCES_KEY}",
            self.settings_file.display()
        );
        open::that_detached(&self.settings_file).map_err(|source| InstallerError::Open {
            target: self.settings_file.clone(),
            source,
        })
    }

    fn launch_installer(&self, package: &Path, mime_type: &str) -> Result<(), InstallerError> {
        if !package.is_file() {
            return Err(InstallerError::MissingPackage {
                path: package.to_path_buf(),
            });
        }
        info!(
            "Handing {} ({mime_type}) to the system installer",
            package.display()
        );
        open::that_detached(package).map_err(|source| InstallerError::Open {
            target: package.to_path_buf(),
            source,
        })
    }
}

fn allow_unknown_sources(settings_file: &Path) -> bool {
    let content = match std::fs::read_to_string(settings_file) {
        Ok(content) => content,
        Err(error) => {
            debug!(
                "Install permission unreadable from {}: {error}",
                settings_file.display()
            );
            return false;
        }
    };
    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(value) => value
            .get(ALLOW_UNKNOWN_SOURCES_KEY)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false),
        Err(error) => {
            warn!(
                "Settings file {} is not valid JSON: {error}",
                settings_file.display()
            );
            false
        }
    }
}
