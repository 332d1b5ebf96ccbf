//! Configuration loader

use std::path::Path;

use tickbridge_utils::{config_file, BridgeError, Result};

use super::AppConfig;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default location
    pub fn load() -> Result<AppConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| BridgeError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| BridgeError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(config: &AppConfig) -> Result<()> {
        let network = &config.network;

        if !network.bind_address.is_loopback() {
            return Err(BridgeError::config(format!(
                "bind_address must be a loopback address, got {}",
                network.bind_address
            )));
        }

        if network.base_port == 0 {
            return Err(BridgeError::config("base_port must be at least 1"));
        }

        if network.base_port > network.max_port {
            return Err(BridgeError::config(format!(
                "base_port ({}) must not exceed max_port ({})",
                network.base_port, network.max_port
            )));
        }

        if network.read_timeout_secs == 0 {
            return Err(BridgeError::config("read_timeout_secs must be at least 1"));
        }

        if network.max_frame_bytes < 1024 {
            return Err(BridgeError::config("max_frame_bytes must be at least 1024"));
        }

        let tick = config.scheduler.tick_interval_ms;
        if tick == 0 || tick > 1000 {
            return Err(BridgeError::config(
                "tick_interval_ms must be between 1 and 1000",
            ));
        }

        let name = &config.discovery.port_file_name;
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(BridgeError::config(
                "port_file_name must be a plain file name",
            ));
        }

        Ok(())
    }

    /// Load from an explicit path or the default location, then validate
    pub fn load_and_validate(path: Option<&Path>) -> Result<AppConfig> {
        let config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load()?,
        };
        Self::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG_TOML;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigLoader::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_default_toml_matches_defaults() {
        let parsed = ConfigLoader::parse(DEFAULT_CONFIG_TOML, Path::new("defaults.toml")).unwrap();
        let defaults = AppConfig::default();

        assert_eq!(parsed.network.bind_address, defaults.network.bind_address);
        assert_eq!(parsed.network.base_port, defaults.network.base_port);
        assert_eq!(parsed.network.max_port, defaults.network.max_port);
        assert_eq!(parsed.network.read_timeout_secs, defaults.network.read_timeout_secs);
        assert_eq!(parsed.network.max_frame_bytes, defaults.network.max_frame_bytes);
        assert_eq!(parsed.scheduler.tick_interval_ms, defaults.scheduler.tick_interval_ms);
        assert_eq!(parsed.scheduler.max_restarts, defaults.scheduler.max_restarts);
        assert_eq!(parsed.discovery.port_file_name, defaults.discovery.port_file_name);
        assert!(parsed.discovery.project_dir.is_none());
    }

    #[test]
    fn test_load_from_path_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(
            &path,
            r#"
            [network]
            base_port = 7000
            max_port = 7010

            [discovery]
            project_dir = "/projects/game"
            "#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.network.base_port, 7000);
        assert_eq!(config.network.max_port, 7010);
        assert_eq!(config.network.read_timeout_secs, 60);
        assert_eq!(config.scheduler.tick_interval_ms, 16);
        assert_eq!(
            config.discovery.port_file(),
            std::path::PathBuf::from("/projects/game/bridge-port.txt")
        );
    }

    #[test]
    fn test_load_from_missing_path() {
        let result = ConfigLoader::load_from_path(Path::new("/nonexistent/tickbridge.toml"));
        assert!(matches!(result, Err(BridgeError::FileRead { .. })));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = ConfigLoader::parse("invalid { toml", Path::new("test.toml"));
        assert!(matches!(result, Err(BridgeError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = AppConfig::default();
        config.network.base_port = 6500;
        config.network.max_port = 6400;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_base_port() {
        let mut config = AppConfig::default();
        config.network.base_port = 0;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_non_loopback() {
        let mut config = AppConfig::default();
        config.network.bind_address = "0.0.0.0".parse().unwrap();
        assert!(ConfigLoader::validate(&config).is_err());

        config.network.bind_address = "::1".parse().unwrap();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_tick_interval() {
        let mut config = AppConfig::default();
        config.scheduler.tick_interval_ms = 0;
        assert!(ConfigLoader::validate(&config).is_err());

        config.scheduler.tick_interval_ms = 5000;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_port_file_with_separator() {
        let mut config = AppConfig::default();
        config.discovery.port_file_name = "../escape.txt".into();
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.network.read_timeout_secs = 0;
        assert!(ConfigLoader::validate(&config).is_err());
    }
}
