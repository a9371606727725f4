// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The Local Configuration Datastore (RFC 3414 §2.3): per-engine
//! `(engine_boots, engine_time)` state as learned from discovery or from a
//! subsequent authenticated response.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

/// Cached timeliness state for one authoritative engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTime {
    pub engine_boots: u32,
    pub engine_time: u32,
    /// Local monotonic clock reading taken when `engine_time` was last
    /// observed, used to extrapolate the current engine time without
    /// re-discovering.
    pub observed_at: std::time::Instant,
}

impl EngineTime {
    /// Engine time extrapolated to now, per RFC 3414 §2.3's `(engineTime +
    /// (now - observed_at))` rule.
    pub fn estimate_now(&self) -> u32 {
        let elapsed = self.observed_at.elapsed().as_secs();
        self.engine_time.saturating_add(elapsed as u32)
    }
}

/// `engine_id -> EngineTime`, shared across clones via an `Arc` so that
/// callers can hand out a cache handle without owning the whole client.
#[derive(Debug, Clone, Default)]
pub struct Lcd {
    inner: Arc<Mutex<HashMap<Vec<u8>, EngineTime>>>,
}

impl Lcd {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, engine_id: &[u8]) -> Option<EngineTime> {
        self.inner.lock().await.get(engine_id).copied()
    }

    /// Records freshly observed engine state. Per RFC 3414 §2.3, a boots
    /// counter going backwards (or staying equal while time goes backwards)
    /// indicates a stale or forged response and must not regress the cache.
    pub async fn update(&self, engine_id: &[u8], engine_boots: u32, engine_time: u32) {
        let mut guard = self.inner.lock().await;
        let candidate = EngineTime {
            engine_boots,
            engine_time,
            observed_at: std::time::Instant::now(),
        };
        match guard.get(engine_id) {
            Some(existing)
                if (engine_boots, engine_time)
                    < (existing.engine_boots, existing.engine_time) => {},
            _ => {
                guard.insert(engine_id.to_vec(), candidate);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_then_get_round_trips() {
        let lcd = Lcd::new();
        lcd.update(b"engine-a", 1, 100).await;
        let cached = lcd.get(b"engine-a").await.unwrap();
        assert_eq!(cached.engine_boots, 1);
        assert_eq!(cached.engine_time, 100);
    }

    #[tokio::test]
    async fn stale_update_does_not_regress_cache() {
        let lcd = Lcd::new();
        lcd.update(b"engine-a", 5, 1000).await;
        lcd.update(b"engine-a", 4, 2000).await;
        let cached = lcd.get(b"engine-a").await.unwrap();
        assert_eq!(cached.engine_boots, 5);
        assert_eq!(cached.engine_time, 1000);
    }

    #[tokio::test]
    async fn unknown_engine_returns_none() {
        let lcd = Lcd::new();
        assert!(lcd.get(b"unknown").await.is_none());
    }
}
