// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Relay Gate
//!
//! HTTP front of a small file relay. Every request passes a per-client
//! admission check before it reaches a handler:
//!
//! - Token bucket per client identifier (forwarding header or peer IP)
//! - Process-wide rate and burst, required at startup
//! - 429 with `Retry-After` on rejection, logged and counted
//! - Background sweep evicting clients idle for more than three minutes

pub mod bucket;
pub mod client_ip;
pub mod config;
pub mod error;
pub mod files;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod middleware;
pub mod public_id;
pub mod reclaimer;

pub use config::Config;
pub use limiter::{Admission, AdmissionController};
pub use middleware::AdmissionLayer;
pub use reclaimer::{Reclaimer, ReclaimerHandle};
