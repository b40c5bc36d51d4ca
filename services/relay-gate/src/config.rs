// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the relay gate.
//!
//! Everything is read from the process environment (optionally seeded from a
//! `.env` file by `main`). The rate and burst settings have no defaults: a
//! missing or malformed value fails startup instead of running with an
//! accidental unlimited or zero-capacity limiter.

use crate::error::ConfigError;
use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_RATE_LIMIT: &str = "RATE_LIMIT";
pub const ENV_RATE_BURST: &str = "RATE_BURST";
pub const ENV_SWEEP_INTERVAL: &str = "SWEEP_INTERVAL_SECS";
pub const ENV_IDLE_TIMEOUT: &str = "IDLE_TIMEOUT_SECS";
pub const ENV_FORWARDED_HEADER: &str = "FORWARDED_HEADER";
pub const ENV_HEALTH_TOKEN: &str = "HC_TOKEN";
pub const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";
pub const ENV_DEV_MODE: &str = "DEV_MODE";

/// Upper bound for the sweep interval and the idle timeout (one year).
pub const MAX_PERIOD_SECS: u64 = 365 * 24 * 60 * 60;

/// Configuration for the relay gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Per-client admission control
    pub rate_limit: RateLimitConfig,

    /// How the client identifier is derived from a request
    #[serde(default)]
    pub client_ip: ClientIpConfig,

    /// Token expected in the `Authorization` header of health checks.
    /// `None` leaves the endpoint open.
    #[serde(default)]
    pub health_token: Option<String>,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Seed the file store with a sample record at startup (default: false)
    #[serde(default)]
    pub dev_mode: bool,
}

/// Token bucket parameters, identical for every client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained refill rate in requests per second (fractional)
    pub rate: f64,

    /// Bucket capacity; also the number of back-to-back requests a new client gets
    pub burst: u32,

    /// Period of the idle-client sweep in seconds (default: 60)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Clients unseen for longer than this are evicted (default: 180)
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

/// Client identifier extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientIpConfig {
    /// Trusted forwarding header, consulted before the peer address
    #[serde(default = "default_forwarded_header")]
    pub forwarded_header: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_idle_timeout_secs() -> u64 {
    180
}

fn default_forwarded_header() -> String {
    "x-forwarded-for".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            forwarded_header: default_forwarded_header(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rate = required(&lookup, ENV_RATE_LIMIT)?;
        let burst = required(&lookup, ENV_RATE_BURST)?;

        let config = Config {
            bind_addr: optional(&lookup, ENV_BIND_ADDR)?.unwrap_or_else(default_bind_addr),
            rate_limit: RateLimitConfig {
                rate,
                burst,
                sweep_interval_secs: optional(&lookup, ENV_SWEEP_INTERVAL)?
                    .unwrap_or_else(default_sweep_interval_secs),
                idle_timeout_secs: optional(&lookup, ENV_IDLE_TIMEOUT)?
                    .unwrap_or_else(default_idle_timeout_secs),
            },
            client_ip: ClientIpConfig {
                forwarded_header: lookup(ENV_FORWARDED_HEADER)
                    .map(|v| v.trim().to_ascii_lowercase())
                    .unwrap_or_else(default_forwarded_header),
            },
            health_token: lookup(ENV_HEALTH_TOKEN).filter(|t| !t.is_empty()),
            metrics: MetricsConfig {
                enabled: match lookup(ENV_METRICS_ENABLED) {
                    Some(v) => parse_bool(ENV_METRICS_ENABLED, &v)?,
                    None => default_true(),
                },
                ..Default::default()
            },
            dev_mode: match lookup(ENV_DEV_MODE) {
                Some(v) => parse_bool(ENV_DEV_MODE, &v)?,
                None => false,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limit.validate()?;
        self.client_ip.header_name()?;
        Ok(())
    }
}

impl RateLimitConfig {
    /// Rate limit config with the default sweep interval and idle timeout.
    pub fn new(rate: f64, burst: u32) -> Self {
        Self {
            rate,
            burst,
            sweep_interval_secs: default_sweep_interval_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(ConfigError::invalid(
                ENV_RATE_LIMIT,
                &self.rate.to_string(),
                "must be a finite number greater than zero",
            ));
        }
        // One token must accrue within a representable wait.
        if Duration::try_from_secs_f64(1.0 / self.rate).is_err() {
            return Err(ConfigError::invalid(
                ENV_RATE_LIMIT,
                &self.rate.to_string(),
                "too small to ever refill a token",
            ));
        }
        if self.burst == 0 {
            return Err(ConfigError::invalid(ENV_RATE_BURST, "0", "must be at least 1"));
        }
        for (key, secs) in [
            (ENV_SWEEP_INTERVAL, self.sweep_interval_secs),
            (ENV_IDLE_TIMEOUT, self.idle_timeout_secs),
        ] {
            if !(1..=MAX_PERIOD_SECS).contains(&secs) {
                return Err(ConfigError::invalid(
                    key,
                    &secs.to_string(),
                    format!("must be between 1 and {MAX_PERIOD_SECS}"),
                ));
            }
        }
        Ok(())
    }

    /// Get the sweep period, capped at [`MAX_PERIOD_SECS`]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.min(MAX_PERIOD_SECS))
    }

    /// Get the idle eviction threshold, capped at [`MAX_PERIOD_SECS`]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.min(MAX_PERIOD_SECS))
    }
}

impl ClientIpConfig {
    /// Parse the configured forwarding header name.
    pub fn header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::from_bytes(self.forwarded_header.as_bytes())
            .map_err(|e| ConfigError::invalid(ENV_FORWARDED_HEADER, &self.forwarded_header, e))
    }
}

fn required<T, F>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key)?.ok_or(ConfigError::Missing(key))
}

fn optional<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::invalid(key, &raw, e)),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw, "expected a boolean")),
    }
}
