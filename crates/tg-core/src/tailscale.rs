//! Tailscale CLI directory source
//!
//! Obtains the member directory by running `tailscale status --json`
//! and parsing the `Peer` map out of the response. This is the default
//! [`DirectorySource`] used by the guard daemon; anything that can
//! produce a [`DirectorySnapshot`] can stand in for it.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::DirectoryError;
use crate::source::DirectorySource;
use crate::types::{DirectorySnapshot, Peer};

/// Status response from `tailscale status --json`, reduced to the
/// fields the directory needs
#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(
        rename = "Peer",
        default,
        deserialize_with = "deserialize_null_as_empty_map"
    )]
    peers: HashMap<String, PeerEntry>,
}

/// One peer entry in the status JSON
///
/// `TailAddr` can be missing or null for peers that have not been
/// assigned an address yet; such records are invalid and skipped.
#[derive(Debug, Deserialize)]
struct PeerEntry {
    #[serde(rename = "HostName", default)]
    hostname: String,
    #[serde(rename = "TailAddr", default)]
    addr: Option<IpAddr>,
    #[serde(rename = "OS", default)]
    os: String,
}

/// Deserialize null as an empty HashMap
///
/// `tailscale status` emits `"Peer": null` when the tailnet has no
/// other members.
fn deserialize_null_as_empty_map<'de, D, K, V>(
    deserializer: D,
) -> Result<HashMap<K, V>, D::Error>
where
    D: serde::Deserializer<'de>,
    K: std::cmp::Eq + std::hash::Hash + Deserialize<'de>,
    V: Deserialize<'de>,
{
    Option::<HashMap<K, V>>::deserialize(deserializer).map(|opt| opt.unwrap_or_default())
}

/// Parse raw `tailscale status --json` output into a snapshot
pub fn parse_status(raw: &[u8]) -> Result<DirectorySnapshot, DirectoryError> {
    let status: StatusResponse = serde_json::from_slice(raw)?;
    let peers = status.peers.into_values().filter_map(|entry| {
        let addr = entry.addr?;
        Some(Peer {
            hostname: entry.hostname,
            addr,
            os: entry.os,
        })
    });
    Ok(DirectorySnapshot::new(peers))
}

/// Directory source backed by the local `tailscale` binary
pub struct TailscaleCli {
    /// Upper bound on one status invocation
    fetch_timeout: Duration,
}

impl TailscaleCli {
    /// Create a new CLI source with the given per-fetch timeout
    pub fn new(fetch_timeout: Duration) -> Self {
        Self { fetch_timeout }
    }
}

#[async_trait]
impl DirectorySource for TailscaleCli {
    async fn fetch(&self) -> Result<DirectorySnapshot, DirectoryError> {
        let output = timeout(
            self.fetch_timeout,
            Command::new("tailscale").args(["status", "--json"]).output(),
        )
        .await
        .map_err(|_| DirectoryError::Timeout(self.fetch_timeout))?
        .map_err(DirectoryError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(DirectoryError::Status(stderr));
        }

        let snapshot = parse_status(&output.stdout)?;
        tracing::debug!("fetched tailnet directory: {} peers", snapshot.len());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_peers() {
        let raw = br#"{
            "BackendState": "Running",
            "Peer": {
                "nodekey:aaaa": {"HostName": "alice", "TailAddr": "100.64.0.9", "OS": "linux"},
                "nodekey:bbbb": {"HostName": "bob", "TailAddr": "100.64.0.10", "OS": "macOS"}
            }
        }"#;
        let snap = parse_status(raw).unwrap();
        assert_eq!(snap.len(), 2);
        let alice = snap.get("100.64.0.9".parse().unwrap()).unwrap();
        assert_eq!(alice.hostname, "alice");
        assert_eq!(alice.os, "linux");
    }

    #[test]
    fn test_parse_status_null_peer_map() {
        let raw = br#"{"BackendState": "Running", "Peer": null}"#;
        let snap = parse_status(raw).unwrap();
        assert!(snap.is_empty());
    }

    #[test]
    fn test_parse_status_missing_peer_map() {
        let raw = br#"{"BackendState": "Stopped"}"#;
        let snap = parse_status(raw).unwrap();
        assert!(snap.is_empty());
    }

    #[test]
    fn test_parse_status_skips_addressless_peers() {
        let raw = br#"{
            "Peer": {
                "nodekey:aaaa": {"HostName": "alice", "TailAddr": "100.64.0.9", "OS": "linux"},
                "nodekey:bbbb": {"HostName": "pending", "TailAddr": null, "OS": "windows"}
            }
        }"#;
        let snap = parse_status(raw).unwrap();
        assert_eq!(snap.len(), 1);
        assert!(snap.contains("100.64.0.9".parse().unwrap()));
    }

    #[test]
    fn test_parse_status_rejects_garbage() {
        assert!(matches!(
            parse_status(b"not json at all"),
            Err(DirectoryError::Parse(_))
        ));
    }
}
