//! Core error types for tailgate

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the tailgate ecosystem
#[derive(Error, Debug)]
pub enum TgError {
    /// Directory source error
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Self-identity error
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from fetching or parsing the member directory
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// The status command could not be spawned or its output collected
    #[error("failed to run tailscale status: {0}")]
    Spawn(#[source] std::io::Error),

    /// The status command exited with a failure status
    #[error("tailscale status failed: {0}")]
    Status(String),

    /// The status output was not valid JSON of the expected shape
    #[error("failed to parse tailscale status output: {0}")]
    Parse(#[from] serde_json::Error),

    /// The status command did not finish within the allotted time
    #[error("tailscale status timed out after {0:?}")]
    Timeout(Duration),

    /// The background refresh task died before producing a result
    #[error("directory refresh task failed: {0}")]
    RefreshTask(String),
}

/// Errors from resolving this host's own tailnet identity
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Interface enumeration failed
    #[error("failed to enumerate network interfaces: {0}")]
    Netif(#[from] std::io::Error),

    /// No interface carries a tailnet address
    #[error("host has no tailnet interface")]
    NotJoined,

    /// The machine hostname is not valid UTF-8
    #[error("machine hostname is not valid UTF-8")]
    Hostname,
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
