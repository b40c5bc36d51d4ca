// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Continuous-refill token bucket.
//!
//! Callers pass the current instant explicitly so the bucket itself never
//! reads a clock.

use std::time::Duration;
use tokio::time::Instant;

/// Token bucket for a single client.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    /// Available tokens
    tokens: f64,
    /// Maximum tokens (bucket capacity)
    max_tokens: f64,
    /// Token refill rate per second
    refill_rate: f64,
    /// Last time tokens were refilled
    last_refill: Instant,
}

impl TokenBucket {
    /// A bucket primed with `burst` tokens.
    pub fn full(rate: f64, burst: u32, now: Instant) -> Self {
        let max_tokens = f64::from(burst);
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate: rate,
            last_refill: now,
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&mut self, now: Instant) {
        // Instants earlier than the last refill add nothing.
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        if now > self.last_refill {
            self.last_refill = now;
        }
    }

    /// Try to consume a token. Returns true if successful.
    pub fn try_consume(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens available as of the last refill.
    pub fn available(&self) -> f64 {
        self.tokens
    }

    /// Get time until a token is available.
    pub fn time_until_available(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            let needed = 1.0 - self.tokens;
            Duration::try_from_secs_f64(needed / self.refill_rate).unwrap_or(Duration::MAX)
        }
    }
}
