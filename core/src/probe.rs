//! Pre-run network sanity check.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Public address used when no probe target is configured.
pub const DEFAULT_PROBE_TARGET: &str = "8.8.8.8:80";

/// Connect a UDP socket to `target` and return the local address the OS
/// picked for the route. Nothing is sent; this only checks that a route
/// exists.
pub fn check_reachability(target: impl ToSocketAddrs) -> io::Result<SocketAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(target)?;
    let local = socket.local_addr()?;
    tracing::debug!(%local, "network route available");
    Ok(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_is_reachable() {
        let local = check_reachability("127.0.0.1:9").unwrap();
        assert!(local.ip().is_loopback());
    }

    #[test]
    fn unresolvable_target_is_an_error() {
        assert!(check_reachability("definitely-not-a-host.invalid:80").is_err());
    }
}
