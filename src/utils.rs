// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::atomic::{AtomicI32, Ordering};

use once_cell::sync::Lazy;
use rand::Rng;

/// Request IDs are 31-bit non-negative integers (RFC 1157 `INTEGER`).
const REQUEST_ID_MASK: i32 = 0x7FFF_FFFF;

/// Process-wide monotonic counter, seeded with a random offset at start-up
/// so successive runs don't reuse IDs a still-in-flight peer might answer
/// against stale state.
static REQUEST_ID_COUNTER: Lazy<AtomicI32> = Lazy::new(|| {
    let seed = rand::rng().random_range(0..=REQUEST_ID_MASK);
    AtomicI32::new(seed)
});

/// Returns the next request ID, wrapped into the 31-bit non-negative range.
pub fn next_request_id() -> i32 {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed) & REQUEST_ID_MASK
}
