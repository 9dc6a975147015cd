/*
 * Facade-wide settings and their persistence.
 *
 * `FacadeConfig` is stored as JSON in the per-user configuration directory.
 * Every field has a default, so a missing file, or a file that names only some
 * fields, still yields a complete configuration. Loading goes through the
 * `ConfigManagerOperations` trait so callers and tests can substitute their own
 * storage.
 */
use crate::environment::path_utils;
use crate::platform_layer::error::FacadeError;
use crate::platform_layer::types::Size;

use serde::{Deserialize, Serialize};
use simplelog::LevelFilter;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

const CONFIG_FILENAME: &str = "winfacade.json";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
    NoConfigDirectory,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "Configuration parse error: {e}"),
            ConfigError::NoConfigDirectory => {
                write!(f, "Could not determine the configuration directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::NoConfigDirectory => None,
        }
    }
}

impl From<ConfigError> for FacadeError {
    fn from(err: ConfigError) -> Self {
        FacadeError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
    /// When set, log records are also appended to this file.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    // An unrecognised level falls back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.level).unwrap_or_else(|_| {
            log::warn!(
                "Config: Unknown log level '{}', using 'info'.",
                self.level
            );
            LevelFilter::Info
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacadeConfig {
    /// Prepended to every window class name the application registers.
    pub class_name_prefix: String,
    pub default_window_size: Size,
    pub center_modal_dialogs: bool,
    /// Show contained handler failures in a message box, not only in the log.
    pub report_unhandled_to_user: bool,
    pub logging: LoggingConfig,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            class_name_prefix: "WinFacade".to_string(),
            default_window_size: Size::new(800, 600),
            center_modal_dialogs: true,
            report_unhandled_to_user: true,
            logging: LoggingConfig::default(),
        }
    }
}

pub trait ConfigManagerOperations {
    fn load_config(&self, app_name: &str) -> Result<FacadeConfig>;
    fn save_config(&self, app_name: &str, config: &FacadeConfig) -> Result<()>;
}

/*
 * File-backed configuration. By default the file lives in the application's
 * local configuration directory; `with_directory` pins it elsewhere.
 */
#[derive(Debug, Default)]
pub struct CoreConfigManager {
    directory: Option<PathBuf>,
}

impl CoreConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
        }
    }

    fn config_file(&self, app_name: &str) -> Result<PathBuf> {
        let directory = match &self.directory {
            Some(directory) => directory.clone(),
            None => path_utils::get_base_app_config_local_dir(app_name)
                .ok_or(ConfigError::NoConfigDirectory)?,
        };
        Ok(directory.join(CONFIG_FILENAME))
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    fn load_config(&self, app_name: &str) -> Result<FacadeConfig> {
        let file_path = self.config_file(app_name)?;
        if !file_path.exists() {
            log::debug!("CoreConfigManager: {file_path:?} does not exist; using defaults.");
            return Ok(FacadeConfig::default());
        }
        let contents = fs::read_to_string(&file_path)?;
        let config = serde_json::from_str(&contents)?;
        log::debug!("CoreConfigManager: Loaded configuration from {file_path:?}.");
        Ok(config)
    }

    fn save_config(&self, app_name: &str, config: &FacadeConfig) -> Result<()> {
        let file_path = self.config_file(app_name)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, serde_json::to_string_pretty(config)?)?;
        log::debug!("CoreConfigManager: Saved configuration to {file_path:?}.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_yields_defaults() {
        // Arrange
        let dir = tempdir().expect("Failed to create temp dir");
        let manager = CoreConfigManager::with_directory(dir.path());

        // Act
        let config = manager.load_config("TestApp").expect("load failed");

        // Assert
        assert_eq!(config, FacadeConfig::default());
        assert_eq!(config.default_window_size, Size::new(800, 600));
        assert!(config.center_modal_dialogs);
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        // Arrange
        let dir = tempdir().expect("Failed to create temp dir");
        let manager = CoreConfigManager::with_directory(dir.path().join("nested"));
        let config = FacadeConfig {
            class_name_prefix: "Sample".to_string(),
            center_modal_dialogs: false,
            logging: LoggingConfig {
                level: "debug".to_string(),
                file: Some(PathBuf::from("facade.log")),
            },
            ..FacadeConfig::default()
        };

        // Act
        manager.save_config("TestApp", &config).expect("save failed");
        let loaded = manager.load_config("TestApp").expect("load failed");

        // Assert
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        // Arrange
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "class_name_prefix": "Partial", "logging": { "level": "trace" } }"#,
        )
        .expect("Failed to write config");
        let manager = CoreConfigManager::with_directory(dir.path());

        // Act
        let config = manager.load_config("TestApp").expect("load failed");

        // Assert
        assert_eq!(config.class_name_prefix, "Partial");
        assert_eq!(config.logging.level_filter(), LevelFilter::Trace);
        assert_eq!(config.logging.file, None);
        assert!(config.report_unhandled_to_user);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        // Arrange
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join(CONFIG_FILENAME), "{ not json").expect("write failed");
        let manager = CoreConfigManager::with_directory(dir.path());

        // Act
        let result = manager.load_config("TestApp");

        // Assert
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        let facade_error: FacadeError = result.unwrap_err().into();
        assert!(matches!(facade_error, FacadeError::Config(_)));
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let logging = LoggingConfig {
            level: "loud".to_string(),
            file: None,
        };
        assert_eq!(logging.level_filter(), LevelFilter::Info);
    }
}
