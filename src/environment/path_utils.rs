/*
 * Locates the per-user directory that holds the facade's configuration file.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

/*
 * Retrieves the application's local (non-roaming) configuration directory,
 * creating it when it does not yet exist. No organization qualifier is used, so
 * the directory sits directly under the user's local application data.
 *
 * Returns `None` if the platform reports no suitable location or the directory
 * could not be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving config directory for '{app_name}'");
    let proj_dirs = ProjectDirs::from("", "", app_name)?;
    let config_path = proj_dirs.config_local_dir();
    if !config_path.exists() {
        if let Err(e) = fs::create_dir_all(config_path) {
            log::error!("PathUtils: Failed to create config directory {config_path:?}: {e}");
            return None;
        }
        log::debug!("PathUtils: Created config directory {config_path:?}");
    }
    Some(config_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_base_app_config_local_dir_creates_directory() {
        // Arrange
        let unique_app_name = format!("WinFacade_PathUtils_{}", rand::random::<u128>());

        // Act
        let path = get_base_app_config_local_dir(&unique_app_name);

        // Assert
        if let Some(path) = path {
            assert!(path.is_dir());
            assert!(path.to_string_lossy().contains(&unique_app_name));
            let _ = fs::remove_dir_all(&path);
        }
    }
}
