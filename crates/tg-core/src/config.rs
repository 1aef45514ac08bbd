//! Configuration management for tailgate

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the guard daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Address to bind the HTTP server to; defaults to the tailnet
    /// interface address resolved at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<IpAddr>,

    /// Port to serve on
    pub port: u16,

    /// How long a fetched directory snapshot stays fresh. Zero forces
    /// a fetch on every request. Expressed in whole seconds, so a
    /// negative value is rejected at parse time.
    #[serde(with = "duration_secs")]
    pub cache_ttl: Duration,

    /// Upper bound on one directory fetch
    #[serde(with = "duration_secs")]
    pub fetch_timeout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            bind_address: None,
            port: 8470,
            cache_ttl: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tailgate")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a file
pub fn save_config<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::Invalid(format!("Failed to create config dir: {}", e)))?;
    }

    std::fs::write(path, content)
        .map_err(|e| ConfigError::Invalid(format!("Failed to write config: {}", e)))?;
    Ok(())
}

/// Helper module for Duration serialization as seconds
mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize a Duration as seconds (u64)
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    /// Deserialize a Duration from seconds (u64)
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();
        assert_eq!(config.port, 8470);
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert!(config.bind_address.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = GuardConfig {
            bind_address: Some("100.64.0.5".parse().unwrap()),
            port: 9000,
            cache_ttl: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(2),
        };
        save_config(&path, &config).unwrap();

        let loaded: GuardConfig = load_config(&path).unwrap();
        assert_eq!(loaded.port, 9000);
        assert_eq!(loaded.cache_ttl, Duration::from_secs(5));
        assert_eq!(loaded.bind_address, config.bind_address);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cache_ttl = 0\n").unwrap();

        let loaded: GuardConfig = load_config(&path).unwrap();
        assert_eq!(loaded.cache_ttl, Duration::ZERO);
        assert_eq!(loaded.port, 8470);
    }

    #[test]
    fn test_negative_ttl_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cache_ttl = -5\n").unwrap();

        let result: Result<GuardConfig, _> = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let result: Result<GuardConfig, _> = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
