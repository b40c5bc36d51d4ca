// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Public identifiers for relayed files and posts.
//!
//! An ID is ten ASCII characters: five digits taken from the leading digits of
//! the creation timestamp, then five letters drawn at random from
//! [`LETTERS`].

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Alphabet for the random half. `E` and `W` are excluded.
pub const LETTERS: &[u8] = b"ABCDFGHIJKLMNOPQRSTUVXYZ";

pub const ID_LEN: usize = 10;
const DIGITS_LEN: usize = 5;

/// Generate a fresh public ID.
pub fn generate() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut id: String = format!("{nanos:0>width$}", width = DIGITS_LEN)
        .chars()
        .take(DIGITS_LEN)
        .collect();

    let mut rng = rand::thread_rng();
    id.extend((0..ID_LEN - DIGITS_LEN).map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char));
    id
}

/// Whether `id` has the shape of a public ID.
pub fn validate(id: &str) -> bool {
    let bytes = id.as_bytes();
    if bytes.len() != ID_LEN {
        return false;
    }
    let (digits, letters) = bytes.split_at(DIGITS_LEN);
    digits.iter().all(u8::is_ascii_digit) && letters.iter().all(|b| LETTERS.contains(b))
}
