use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ops::Author;

const APP_DIR: &str = "dokuwiki2git";

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/dokuwiki2git or ~/.config/dokuwiki2git
    /// - macOS: ~/Library/Application Support/dokuwiki2git
    /// - Windows: %APPDATA%\dokuwiki2git
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join(APP_DIR))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join(APP_DIR))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join("Library").join("Application Support").join(APP_DIR))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join(APP_DIR))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(format!(".{APP_DIR}")))
        }
    }

    /// Get the settings file path (config.toml)
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("dokuwiki2git.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
        Ok(config_dir)
    }
}

/// Conversion settings
///
/// Loaded from `config.toml` (every key optional) and then overridden by
/// command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory the repository is created in
    pub output_dir: PathBuf,

    /// Appended verbatim to every page path
    pub extension: String,

    /// Target format for the external converter; no conversion when unset
    pub convert_format: Option<String>,

    /// User directory location; defaults to `../conf/users.auth.php` next to the data directory
    pub users_file: Option<PathBuf>,

    /// Local part of the address synthesized for logins missing from the user directory
    pub email_service: String,

    /// Run `git gc` once the conversion is done
    pub gc: bool,

    /// Author of anonymous edits and of the commits the tool itself makes
    pub identity: Author,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            output_dir: PathBuf::from("gitdir"),
            extension: ".txt".to_string(),
            convert_format: None,
            users_file: None,
            identity: Author::new("dokuwiki2git", "dokuwiki2git@localhost"),
            email_service: "dokuwiki".to_string(),
            gc: false,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; an explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (ConfigManager::settings_path()?, false),
        };

        if !explicit && !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        log::debug!("Loaded settings from {}", config_path.display());
        Ok(settings)
    }
}
