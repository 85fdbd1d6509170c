// src/infra/clock.rs
//! Источник времени для интентов и прохода назначения.
//!
//! Ядро время не читает само: `now_ts` всегда передаётся параметром.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::Timestamp;

pub trait Clock: Send + Sync {
    /// Текущее время, секунды.
    fn now_ts(&self) -> Timestamp;
}

/// Системные часы (UNIX-время).
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ts(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Ручные часы для тестов и реплея.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, ts: Timestamp) {
        self.now.store(ts, Ordering::SeqCst);
    }

    /// Сдвинуть время вперёд и вернуть новое значение.
    pub fn advance(&self, secs: u64) -> Timestamp {
        self.now.fetch_add(secs, Ordering::SeqCst) + secs
    }
}

impl Clock for ManualClock {
    fn now_ts(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
