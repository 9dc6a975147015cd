/*
 * Installs the process-wide logger: a terminal logger, plus a file logger when
 * `LoggingConfig::file` is set. Only the first successful call installs
 * anything; later calls report `Ok(false)` and leave the active logger alone.
 */
use crate::environment::config::LoggingConfig;
use crate::platform_layer::error::{FacadeError, Result as FacadeResult};

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::OpenOptions;

pub fn init(config: &LoggingConfig) -> FacadeResult<bool> {
    let level = config.level_filter();
    let log_config = ConfigBuilder::new()
        .set_target_level(simplelog::LevelFilter::Error)
        .set_thread_level(simplelog::LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        log_config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = &config.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                FacadeError::InitializationFailed(format!("cannot open log file {path:?}: {e}"))
            })?;
        loggers.push(WriteLogger::new(level, log_config, file));
    }

    match CombinedLogger::init(loggers) {
        Ok(()) => {
            log::debug!("Logging: Initialized at level {level}.");
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_init_is_a_no_op() {
        // Arrange
        let dir = tempdir().expect("Failed to create temp dir");
        let config = LoggingConfig {
            level: "debug".to_string(),
            file: Some(dir.path().join("facade.log")),
        };

        // Act
        let first = init(&config).expect("first init failed");
        let second = init(&config).expect("second init failed");

        // Assert
        // Another test may already have installed a logger in this process.
        if first {
            assert!(dir.path().join("facade.log").exists());
        }
        assert!(!second);
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        // Arrange
        let dir = tempdir().expect("Failed to create temp dir");
        let config = LoggingConfig {
            level: "info".to_string(),
            file: Some(dir.path().join("missing").join("facade.log")),
        };

        // Act
        let result = init(&config);

        // Assert
        assert!(matches!(result, Err(FacadeError::InitializationFailed(_))));
    }
}
