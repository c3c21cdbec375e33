#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorDetail {
    Message(String),
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl std::fmt::Display for AppErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => write!(f, "{message}"),
            Self::Io { kind, message } => write!(f, "{kind}: {message}"),
        }
    }
}

impl From<String> for AppErrorDetail {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for AppErrorDetail {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<std::io::Error> for AppErrorDetail {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<firekiosk_core::FeedError> for AppErrorDetail {
    fn from(value: firekiosk_core::FeedError) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<firekiosk_core::ArtifactError> for AppErrorDetail {
    fn from(value: firekiosk_core::ArtifactError) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<firekiosk_platform::InstallerError> for AppErrorDetail {
    fn from(value: firekiosk_platform::InstallerError) -> Self {
        Self::Message(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    UpdateCheckFailed {
        details: AppErrorDetail,
    },
    AutoUpdateFailed {
        phase: &'static str,
        details: AppErrorDetail,
    },
    InstallPermissionRequired,
    SettingsSaveFailed {
        details: AppErrorDetail,
    },
}

impl AppError {
    pub fn update_check_failed(details: impl Into<AppErrorDetail>) -> Self {
        Self::UpdateCheckFailed {
            details: details.into(),
        }
    }

    pub fn auto_update_failed(phase: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::AutoUpdateFailed {
            phase,
            details: details.into(),
        }
    }

    pub fn settings_save_failed(details: impl Into<AppErrorDetail>) -> Self {
        Self::SettingsSaveFailed {
            details: details.into(),
        }
    }

    /// The underlying cause without the summary prefix of `Display`, for
    /// dialogs that already carry their own title.
    pub fn details(&self) -> String {
        match self {
            Self::UpdateCheckFailed { details }
            | Self::AutoUpdateFailed { details, .. }
            | Self::SettingsSaveFailed { details } => details.to_string(),
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpdateCheckFailed { details } => write!(f, "Update check failed: {details}"),
            Self::AutoUpdateFailed { phase, details } => {
                write!(f, "App update {phase} failed: {details}")
            }
            Self::InstallPermissionRequired => {
                write!(f, "Installing updates from unknown sources is not allowed")
            }
            Self::SettingsSaveFailed { details } => {
                write!(f, "Failed to save settings: {details}")
            }
        }
    }
}

impl std::error::Error for AppError {}
