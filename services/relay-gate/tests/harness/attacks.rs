// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Traffic patterns for flood simulation.

use std::time::Duration;

/// Traffic pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Requests per second rate
    pub requests_per_second: f64,
    /// Number of unique IPs to simulate
    pub unique_ips: usize,
    /// Send the client IP in the forwarding header instead of the peer address
    pub via_proxy: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            requests_per_second: 10.0,
            unique_ips: 1,
            via_proxy: false,
        }
    }
}

/// Predefined traffic patterns.
impl AttackConfig {
    /// Single IP flood - simulates basic DoS from one source.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 200,
            requests_per_second: 100.0,
            unique_ips: 1,
            ..Default::default()
        }
    }

    /// Distributed attack - many IPs, low rate each.
    pub fn distributed_attack() -> Self {
        Self {
            total_requests: 500,
            requests_per_second: 50.0,
            unique_ips: 100,
            ..Default::default()
        }
    }

    /// Flood relayed through a reverse proxy that sets the forwarding header.
    pub fn proxied_flood() -> Self {
        Self {
            total_requests: 100,
            requests_per_second: 100.0,
            unique_ips: 1,
            via_proxy: true,
        }
    }

    /// Slow drip - stay just under the sustained rate.
    pub fn slow_drip() -> Self {
        Self {
            total_requests: 30,
            requests_per_second: 0.9,
            unique_ips: 1,
            ..Default::default()
        }
    }

    /// Gap between consecutive requests.
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.requests_per_second)
    }

    /// Calculate expected duration for the attack.
    pub fn expected_duration(&self) -> Duration {
        Duration::from_secs_f64(self.total_requests as f64 / self.requests_per_second)
    }

    /// Upper bound on admissions for one client: the initial burst plus
    /// whatever refills during the run.
    pub fn max_admitted_per_ip(&self, rate: f64, burst: u32) -> usize {
        burst as usize + (self.expected_duration().as_secs_f64() * rate).ceil() as usize
    }
}
