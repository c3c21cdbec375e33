use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR_NAME: &str = "firekiosk";

/// Keeps every kiosk file under one directory instead of the per-user
/// platform locations, for portable or read-only-home installs.
pub const HOME_ENV_VAR: &str = "FIREKIOSK_HOME";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppPathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
    #[error("Could not determine config directory")]
    ConfigDirUnavailable,
    #[error("Could not determine cache directory")]
    CacheDirUnavailable,
    #[error("Could not determine data directory")]
    DataDirUnavailable,
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Resolve application paths from [`HOME_ENV_VAR`], falling back to
    /// the platform's per-user directories.
    ///
    /// # Errors
    /// Returns an error when a required base directory (for example the user
    /// home/config/cache/data directory) cannot be determined.
    pub fn new() -> Result<Self, AppPathsError> {
        match std::env::var_os(HOME_ENV_VAR) {
            Some(root) if !root.is_empty() => Ok(Self::rooted_at(Path::new(&root))),
            _ => Self::platform_default(),
        }
    }

    /// All directories as siblings under `root`.
    #[must_use]
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
        }
    }

    fn platform_default() -> Result<Self, AppPathsError> {
        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().ok_or(AppPathsError::HomeDirUnavailable)?;
            Ok(Self {
                config_dir: home.join("Library/Application Support").join(APP_DIR_NAME),
                cache_dir: home.join("Library/Caches").join(APP_DIR_NAME),
                data_dir: home.join("Library/Application Support").join(APP_DIR_NAME),
            })
        }

        #[cfg(not(target_os = "macos"))]
        {
            Ok(Self {
                config_dir: dirs::config_dir()
                    .ok_or(AppPathsError::ConfigDirUnavailable)?
                    .join(APP_DIR_NAME),
                cache_dir: dirs::cache_dir()
                    .ok_or(AppPathsError::CacheDirUnavailable)?
                    .join(APP_DIR_NAME),
                data_dir: dirs::data_dir()
                    .ok_or(AppPathsError::DataDirUnavailable)?
                    .join(APP_DIR_NAME),
            })
        }
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Fixed scratch file every update download is written to.
    #[must_use]
    pub fn update_artifact_file(&self) -> PathBuf {
        self.cache_dir.join("update.apk")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("debug.log")
    }

    #[must_use]
    pub fn instance_lock_file(&self) -> PathBuf {
        self.data_dir.join("instance.lock")
    }

    /// Ensure all application directories exist on disk.
    ///
    /// # Errors
    /// Returns an error if any directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}
