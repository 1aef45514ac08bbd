//! Tailnet interface resolution
//!
//! Finds the network interface that carries this host's tailnet
//! address. Interface names vary across platforms, so a name-prefix
//! check is only a fast path to skip obvious non-candidates; the
//! authoritative test is membership in the CGNAT block reserved for
//! the tailnet (100.64.0.0/10).

use std::io;
use std::net::IpAddr;

use if_addrs::Interface;

/// Interface name prefixes that may carry a tailnet address
const CANDIDATE_PREFIXES: &[&str] = &["tailscale", "ts", "wg", "utun"];

/// Whether the interface name looks like a tailnet interface
///
/// A fast-path filter only, never the source of truth.
fn maybe_tailnet_interface(name: &str) -> bool {
    CANDIDATE_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Whether an address falls inside the 100.64.0.0/10 block
pub fn is_tailnet_ip(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            octets[0] == 100 && (octets[1] & 0xc0) == 64
        }
        // The reserved block is IPv4-only
        IpAddr::V6(_) => false,
    }
}

/// Return this host's tailnet address and interface, if any
///
/// Enumerates all interfaces, skips those whose name rules them out,
/// and returns the first whose address sits inside the reserved block.
/// `Ok(None)` means the host is simply not joined to a tailnet; only
/// enumeration failures are errors.
pub fn tailnet_interface() -> io::Result<Option<(IpAddr, Interface)>> {
    for iface in if_addrs::get_if_addrs()? {
        if !maybe_tailnet_interface(&iface.name) {
            continue;
        }
        let addr = iface.ip();
        if is_tailnet_ip(addr) {
            return Ok(Some((addr, iface)));
        }
    }
    Ok(None)
}
