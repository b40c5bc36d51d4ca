// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for flood simulation against the relay gate.
//!
//! This module provides client address generators, traffic patterns and an
//! outcome collector for driving the admission layer end to end.

pub mod attacks;
pub mod generators;
pub mod metrics;
