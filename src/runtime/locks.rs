// src/runtime/locks.rs
//! Ключевые блокировки: один tokio-мьютекс на участника / корт / матч.
//!
//! Глобальной блокировки нет. Набор ключей всегда берётся в одном порядке
//! (сортировка по `LockKey`), поэтому два интента не могут зациклиться.
//!
//! Слот ключа живёт, пока его кто-то держит или ждёт: после отпускания
//! незанятые слоты удаляются, таблица не растёт вместе с числом матчей.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::domain::{CourtId, MatchId, ParticipantId};
use crate::engine::EngineError;

/// Что блокируем.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    Court(CourtId),
    Match(MatchId),
    Participant(ParticipantId),
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKey::Court(id) => write!(f, "court:{id}"),
            LockKey::Match(id) => write!(f, "match:{id}"),
            LockKey::Participant(id) => write!(f, "participant:{id}"),
        }
    }
}

type SlotTable = Arc<StdMutex<HashMap<LockKey, Arc<Mutex<()>>>>>;

/// Захваченный набор блокировок. Отпускается при drop.
#[derive(Debug)]
pub struct LockSet {
    keys: Vec<LockKey>,
    guards: Vec<OwnedMutexGuard<()>>,
    table: SlotTable,
}

impl LockSet {
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }
}

impl Drop for LockSet {
    fn drop(&mut self) {
        self.guards.clear();
        prune(&self.table, &self.keys);
    }
}

/// Удалить слоты, которые больше никто не держит и не ждёт.
///
/// Каждый держатель и ожидающий владеет клоном `Arc`, а клон берётся
/// под мьютексом таблицы, поэтому `strong_count == 1` здесь значит "слот свободен".
fn prune(table: &SlotTable, keys: &[LockKey]) {
    let Ok(mut slots) = table.lock() else {
        return;
    };
    for key in keys {
        if slots.get(key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(key);
        }
    }
}

#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: SlotTable,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Захватить все ключи (в отсортированном порядке) за `timeout_ms` суммарно.
    ///
    /// Не успели - `EngineError::Timeout`, уже взятые блокировки отпускаются.
    pub async fn acquire(
        &self,
        mut keys: Vec<LockKey>,
        timeout_ms: u64,
    ) -> Result<LockSet, EngineError> {
        keys.sort();
        keys.dedup();

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut guards = Vec::with_capacity(keys.len());

        for key in &keys {
            let slot = self.slot(key)?;
            let acquired = timeout_at(deadline, slot.lock_owned()).await;
            match acquired {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    warn!(key = %key, timeout_ms, "lock acquisition timed out");
                    guards.clear();
                    prune(&self.slots, &keys);
                    return Err(EngineError::Timeout {
                        operation: format!("lock {key}"),
                        after_ms: timeout_ms,
                    });
                }
            }
        }

        debug!(keys = ?keys, "locks acquired");
        Ok(LockSet {
            keys,
            guards,
            table: Arc::clone(&self.slots),
        })
    }

    /// Сколько ключей сейчас занято или ожидается (для диагностики).
    pub fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &LockKey) -> Result<Arc<Mutex<()>>, EngineError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| EngineError::Internal("lock table poisoned".into()))?;
        Ok(slots.entry(key.clone()).or_default().clone())
    }
}
