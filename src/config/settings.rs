use crate::config::types::{DatabaseSettings, ReuseSettings};
use crate::error::ServiceError;
use serde::Deserialize;
use std::path::Path;

pub const SETTINGS_FILE: &str = "settings.toml";

// Marketplace configuration settings struct
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Settings {
    /// Database connection settings
    #[serde(default)]
    pub database: DatabaseSettings,
    /// Marketplace behaviour settings
    #[serde(default)]
    pub reuse: ReuseSettings,
}

impl Settings {
    pub fn from_toml(raw: &str) -> Result<Self, ServiceError> {
        toml::from_str(raw).map_err(|e| ServiceError::ConfigError(e.to_string()))
    }

    /// Load `settings.toml` from the given directory. Relative sqlite paths are
    /// resolved against that directory and `DATABASE_URL` wins over the file.
    pub fn load(settings_dir: &Path) -> Result<Self, ServiceError> {
        let raw = std::fs::read_to_string(settings_dir.join(SETTINGS_FILE))?;
        let mut settings = Self::from_toml(&raw)?;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            settings.database.url = url;
        } else {
            settings.database.url = resolve_sqlite_url(&settings.database.url, settings_dir);
        }

        Ok(settings)
    }
}

fn resolve_sqlite_url(url: &str, base: &Path) -> String {
    let Some(path) = url.strip_prefix("sqlite://") else {
        return url.to_string();
    };
    if path.starts_with(':') || Path::new(path).is_absolute() {
        return url.to_string();
    }
    format!("sqlite://{}", base.join(path).display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let settings = Settings::from_toml(
            r#"
            [database]
            url = "sqlite:///var/lib/reuse/reuse.db"
            max_connections = 8

            [reuse]
            log_level = "debug"
            strict_proposals = true
            close_competing_trades = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.database.url, "sqlite:///var/lib/reuse/reuse.db");
        assert_eq!(settings.database.max_connections, 8);
        assert_eq!(settings.reuse.log_level, "debug");
        assert!(settings.reuse.strict_proposals);
        assert!(settings.reuse.close_competing_trades);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.reuse.strict_proposals);
        assert_eq!(settings.database.max_connections, 5);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Settings::from_toml("[database\nurl=").unwrap_err();
        assert!(matches!(err, ServiceError::ConfigError(_)));
    }

    #[test]
    fn test_relative_sqlite_path_resolves_in_settings_dir() {
        let base = Path::new("/home/ana/.reuse");
        assert_eq!(
            resolve_sqlite_url("sqlite://reuse.db", base),
            "sqlite:///home/ana/.reuse/reuse.db"
        );
        assert_eq!(
            resolve_sqlite_url("sqlite:///tmp/x.db", base),
            "sqlite:///tmp/x.db"
        );
        assert_eq!(
            resolve_sqlite_url("sqlite::memory:", base),
            "sqlite::memory:"
        );
    }
}
