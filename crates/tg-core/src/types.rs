//! Core domain types

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// A machine on the user's tailnet
///
/// The address is the join key: directory snapshots are keyed by its
/// string form and the middleware matches the transport-level remote
/// IP against it. The field names mirror the upstream status JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Machine hostname (e.g., "lab-server")
    #[serde(rename = "HostName")]
    pub hostname: String,
    /// Tailnet address (e.g., 100.64.1.50)
    #[serde(rename = "TailAddr")]
    pub addr: IpAddr,
    /// Operating system, informational only (e.g., "linux")
    #[serde(rename = "OS")]
    pub os: String,
}

impl Peer {
    /// Bind a TCP listener on this peer's tailnet address
    ///
    /// Services that only listen here are unreachable from outside the
    /// tailnet, which is what makes address-based authorization sound.
    pub async fn bind(&self, port: u16) -> io::Result<TcpListener> {
        TcpListener::bind((self.addr, port)).await
    }
}

/// An immutable point-in-time copy of the member directory
///
/// Keys are normalized address strings. Cloning is an `Arc` bump, so a
/// snapshot can be handed to every request without copying the map.
/// Absence of an address means "not currently a known member", not an
/// error.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    peers: Arc<HashMap<String, Peer>>,
}

impl DirectorySnapshot {
    /// Build a snapshot from a set of peers, keyed by address
    pub fn new(peers: impl IntoIterator<Item = Peer>) -> Self {
        let peers = peers
            .into_iter()
            .map(|p| (p.addr.to_string(), p))
            .collect();
        Self {
            peers: Arc::new(peers),
        }
    }

    /// Whether the given address belongs to a known member
    pub fn contains(&self, addr: IpAddr) -> bool {
        self.peers.contains_key(&addr.to_string())
    }

    /// Look up the member record for an address
    pub fn get(&self, addr: IpAddr) -> Option<&Peer> {
        self.peers.get(&addr.to_string())
    }

    /// Number of known members
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the directory has no members
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Iterate over the member records
    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }
}
