// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Background sweep that evicts idle clients from the admission controller.

use crate::config::RateLimitConfig;
use crate::limiter::AdmissionController;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Periodic idle-client sweep.
pub struct Reclaimer {
    controller: Arc<AdmissionController>,
    interval: Duration,
    idle_timeout: Duration,
}

/// Handle to a running [`Reclaimer`].
///
/// Dropping the handle also stops the sweep loop.
pub struct ReclaimerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Reclaimer {
    /// Sweep `controller` on the period and threshold in `config`.
    pub fn new(controller: Arc<AdmissionController>, config: &RateLimitConfig) -> Self {
        Self {
            controller,
            interval: config.sweep_interval(),
            idle_timeout: config.idle_timeout(),
        }
    }

    /// Start the sweep loop on the current tokio runtime.
    pub fn spawn(self) -> ReclaimerHandle {
        let (shutdown, signal) = watch::channel(false);
        let task = tokio::spawn(self.run(signal));
        ReclaimerHandle { shutdown, task }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            idle_timeout_secs = self.idle_timeout.as_secs(),
            "Reclaimer started"
        );

        // First sweep one full period after start, not immediately.
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.controller.sweep_idle(self.idle_timeout);
                    debug!(evicted, tracked = self.controller.len(), "Sweep finished");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Reclaimer stopped");
    }
}

impl ReclaimerHandle {
    /// Signal the sweep loop to stop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Reclaimer task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
