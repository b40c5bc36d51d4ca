// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for admission decisions.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Counters and gauges owned by one gate instance.
///
/// Each instance carries its own [`Registry`] so several gates (as in tests)
/// never collide on metric names.
pub struct GateMetrics {
    registry: Registry,
    pub admitted: IntCounter,
    pub rejected: IntCounter,
    pub evicted: IntCounter,
    pub tracked_clients: IntGauge,
}

impl GateMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let admitted = IntCounter::new(
            "relay_gate_admitted_total",
            "Requests admitted by the per-client limiter",
        )?;
        let rejected = IntCounter::new(
            "relay_gate_rejected_total",
            "Requests rejected with 429 by the per-client limiter",
        )?;
        let evicted = IntCounter::new(
            "relay_gate_evicted_total",
            "Idle clients removed by the reclaimer",
        )?;
        let tracked_clients = IntGauge::new(
            "relay_gate_tracked_clients",
            "Clients currently holding limiter state",
        )?;

        registry.register(Box::new(admitted.clone()))?;
        registry.register(Box::new(rejected.clone()))?;
        registry.register(Box::new(evicted.clone()))?;
        registry.register(Box::new(tracked_clients.clone()))?;

        Ok(Self {
            registry,
            admitted,
            rejected,
            evicted,
            tracked_clients,
        })
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
