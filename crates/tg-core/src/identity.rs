//! Self-identity query
//!
//! Describes this host as a tailnet peer. Built on demand from the
//! machine hostname and the tailnet interface; never cached, so the
//! answer tracks interface changes.

use crate::error::IdentityError;
use crate::netif;
use crate::types::Peer;

/// Return a peer record describing this host
///
/// Fails with [`IdentityError::NotJoined`] when no interface carries a
/// tailnet address.
pub fn me() -> Result<Peer, IdentityError> {
    let hostname = gethostname::gethostname()
        .into_string()
        .map_err(|_| IdentityError::Hostname)?;
    let (addr, _iface) = netif::tailnet_interface()?.ok_or(IdentityError::NotJoined)?;
    Ok(Peer {
        hostname,
        addr,
        os: std::env::consts::OS.to_string(),
    })
}
