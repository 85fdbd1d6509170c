use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::{IntentId, ParticipantId};

/// Простая генерация ID на основе монотонных счётчиков.
/// Это удобно для локальных тестов, оффчейн-сервисов и т.д.
///
/// В проде ID интента приходит от клиента (ключ идемпотентности),
/// а ID участника - это client id устройства.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    intent_counter: AtomicU64,
    participant_counter: AtomicU64,
}

impl IdGenerator {
    /// Генератор с начальным значением 1 для всех сущностей.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            intent_counter: AtomicU64::new(1),
            participant_counter: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn next_intent_id(&self) -> IntentId {
        let n = self.intent_counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-intent-{n}", self.prefix)
    }

    #[inline]
    pub fn next_participant_id(&self) -> ParticipantId {
        let n = self.participant_counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-player-{n}", self.prefix)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("local")
    }
}
