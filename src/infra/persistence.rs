use std::sync::Mutex;

use tracing::{debug, warn};

use crate::engine::EngineError;
use crate::state::SessionSnapshot;

/// Абстракция хранилища сессии.
///
/// В Linera-режиме вместо этого используется `BadmintonState` и Views,
/// но эта абстракция удобна:
/// - для интеграционных тестов движка,
/// - для оффчейн-сервиса (runtime::SessionHub).
///
/// Запись оптимистичная: `commit` принимает снапшот, прочитанный
/// через `load`, и отказывает, если версия успела измениться.
pub trait SessionStore: Send + Sync {
    /// Загрузить текущий снапшот (с версией).
    fn load(&self) -> Result<SessionSnapshot, EngineError>;

    /// Записать новый снапшот, если версия не изменилась с момента чтения.
    ///
    /// Возвращает новую версию. При гонке - `ConcurrentModification`.
    fn commit(&self, snapshot: SessionSnapshot) -> Result<u64, EngineError>;
}

/// Простая in-memory реализация для тестов и локального запуска.
#[derive(Debug)]
pub struct InMemorySessionStore {
    current: Mutex<SessionSnapshot>,
}

impl InMemorySessionStore {
    pub fn new(initial: SessionSnapshot) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }

    pub fn version(&self) -> Result<u64, EngineError> {
        Ok(self.lock()?.version)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SessionSnapshot>, EngineError> {
        self.current
            .lock()
            .map_err(|_| EngineError::Internal("session store lock poisoned".into()))
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<SessionSnapshot, EngineError> {
        Ok(self.lock()?.clone())
    }

    fn commit(&self, mut snapshot: SessionSnapshot) -> Result<u64, EngineError> {
        let mut current = self.lock()?;

        if current.version != snapshot.version {
            warn!(
                expected = snapshot.version,
                found = current.version,
                "session store: version conflict"
            );
            return Err(EngineError::ConcurrentModification {
                expected: snapshot.version,
                found: current.version,
            });
        }

        snapshot.version += 1;
        let version = snapshot.version;
        *current = snapshot;

        debug!(version, "session store: committed");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionConfig;
    use crate::engine::SessionEngine;

    #[test]
    fn stale_commit_is_rejected() {
        let engine = SessionEngine::new(SessionConfig::doubles_free(2)).unwrap();
        let store = InMemorySessionStore::new(SessionSnapshot::new(engine));

        let a = store.load().unwrap();
        let b = store.load().unwrap();

        assert_eq!(store.commit(a).unwrap(), 1);
        let err = store.commit(b).unwrap_err();
        assert_eq!(err, EngineError::ConcurrentModification { expected: 0, found: 1 });
        assert!(err.is_retryable());
    }
}
