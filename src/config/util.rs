//! Utility functions for the config module.
//! Creates the settings directory and seeds it from the bundled template.
use crate::config::settings::SETTINGS_FILE;
use crate::error::ServiceError;
use std::path::PathBuf;
use tracing::info;

const SETTINGS_TEMPLATE: &[u8] = include_bytes!("../../settings.tpl.toml");

/// Return the settings directory, creating it (and a `settings.toml` copied
/// from the template) when it does not exist yet. Defaults to `~/.reuse`.
pub fn init_default_dir(config_path: Option<String>) -> Result<PathBuf, ServiceError> {
    let settings_dir = match config_path {
        Some(path) => PathBuf::from(path),
        None => dirs::home_dir()
            .ok_or_else(|| ServiceError::ConfigError("cannot locate home directory".into()))?
            .join(".reuse"),
    };

    if !settings_dir.exists() {
        std::fs::create_dir_all(&settings_dir)?;
    }

    let settings_file = settings_dir.join(SETTINGS_FILE);
    if !settings_file.exists() {
        std::fs::write(&settings_file, SETTINGS_TEMPLATE)?;
        info!(
            "Created settings file from template at {}",
            settings_file.display()
        );
    }

    Ok(settings_dir)
}
