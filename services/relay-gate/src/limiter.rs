// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-client admission control.
//!
//! Every client identifier gets its own token bucket, created lazily on the
//! first request and primed to full burst. All buckets share one process-wide
//! rate/burst setting. Idle clients are dropped by [`AdmissionController::sweep_idle`],
//! which the [`Reclaimer`](crate::reclaimer::Reclaimer) calls periodically; a
//! client that returns after eviction starts again with a full bucket.

use crate::bucket::TokenBucket;
use crate::config::RateLimitConfig;
use crate::metrics::GateMetrics;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A token was consumed
    Admitted,
    /// No token available
    Rejected {
        /// Time until the bucket holds a whole token again
        retry_after: Duration,
    },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Limiter state for one client.
#[derive(Debug)]
struct ClientRecord {
    bucket: TokenBucket,
    last_seen: Instant,
}

impl ClientRecord {
    fn new(config: &RateLimitConfig, now: Instant) -> Self {
        Self {
            bucket: TokenBucket::full(config.rate, config.burst, now),
            last_seen: now,
        }
    }

    fn touch(&mut self, now: Instant) {
        if now > self.last_seen {
            self.last_seen = now;
        }
    }
}

/// Thread-safe per-client rate limiter.
///
/// A single mutex guards the whole map. Lookup, creation, token consumption
/// and the `last_seen` bump for a check all happen under one acquisition, so
/// concurrent checks for the same client never over-admit.
pub struct AdmissionController {
    /// Configuration
    config: RateLimitConfig,
    /// Per-client state
    clients: Mutex<HashMap<String, ClientRecord>>,
    metrics: Option<Arc<GateMetrics>>,
}

impl AdmissionController {
    /// Create a controller with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        info!(
            rate = config.rate,
            burst = config.burst,
            "Admission controller initialized"
        );
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
            metrics: None,
        }
    }

    /// Report decisions and evictions to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<GateMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Returns true if `identifier` may proceed.
    pub fn allow(&self, identifier: &str) -> bool {
        self.check(identifier).is_admitted()
    }

    /// Consume a token for `identifier` if one is available.
    ///
    /// Never blocks waiting for a refill.
    pub fn check(&self, identifier: &str) -> Admission {
        let now = Instant::now();

        let admission = {
            let mut clients = self.clients.lock();
            let mut created = false;
            let record = clients.entry(identifier.to_owned()).or_insert_with(|| {
                created = true;
                ClientRecord::new(&self.config, now)
            });
            record.touch(now);

            let admission = if record.bucket.try_consume(now) {
                Admission::Admitted
            } else {
                Admission::Rejected {
                    retry_after: record.bucket.time_until_available(),
                }
            };

            if created {
                debug!(identifier, "Tracking new client");
                if let Some(metrics) = &self.metrics {
                    metrics.tracked_clients.set(clients.len() as i64);
                }
            }
            admission
        };

        match admission {
            Admission::Admitted => {
                if let Some(metrics) = &self.metrics {
                    metrics.admitted.inc();
                }
            }
            Admission::Rejected { retry_after } => {
                warn!(
                    identifier,
                    timestamp = %chrono::Utc::now().to_rfc3339(),
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Rate limit exceeded"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.rejected.inc();
                }
            }
        }

        admission
    }

    /// Remove every client unseen for longer than `idle_timeout`.
    ///
    /// Returns the number of clients evicted.
    pub fn sweep_idle(&self, idle_timeout: Duration) -> usize {
        let now = Instant::now();

        let evicted = {
            let mut clients = self.clients.lock();
            let mut evicted = Vec::new();
            clients.retain(|identifier, record| {
                let keep = now.saturating_duration_since(record.last_seen) <= idle_timeout;
                if !keep {
                    evicted.push(identifier.clone());
                }
                keep
            });
            if let Some(metrics) = &self.metrics {
                metrics.tracked_clients.set(clients.len() as i64);
            }
            evicted
        };

        for identifier in &evicted {
            info!(identifier = %identifier, "Idle client evicted");
        }
        if let Some(metrics) = &self.metrics {
            metrics.evicted.inc_by(evicted.len() as u64);
        }

        evicted.len()
    }

    /// Whether limiter state exists for `identifier`.
    pub fn contains(&self, identifier: &str) -> bool {
        self.clients.lock().contains_key(identifier)
    }

    /// Number of tracked clients.
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
