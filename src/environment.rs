/*
 * Process environment of a facade application: persisted settings, the
 * configuration directory, and logger installation.
 */
pub mod config;
pub mod logging;
pub mod path_utils;

pub use config::{
    ConfigError, ConfigManagerOperations, CoreConfigManager, FacadeConfig, LoggingConfig,
};
