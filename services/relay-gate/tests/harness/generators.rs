// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for flood simulation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Peer addresses with distinct ephemeral ports for the same IP.
pub fn generate_peers(ip: IpAddr, count: usize) -> Vec<SocketAddr> {
    (0..count)
        .map(|i| SocketAddr::new(ip, 40000 + (i % 20000) as u16))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_generate_peers_share_ip() {
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let peers = generate_peers(ip, 10);
        assert!(peers.iter().all(|p| p.ip() == ip));
        let ports: std::collections::HashSet<_> = peers.iter().map(|p| p.port()).collect();
        assert_eq!(ports.len(), 10);
    }
}
