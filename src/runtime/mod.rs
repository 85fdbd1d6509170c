//! Асинхронный слой поверх синхронного ядра (только native).
//!
//! - `locks` - ключевые блокировки (участник / корт / матч) с таймаутом;
//! - `hub` - точка входа: интенты, админ-команды, оптимистичная запись с повтором;
//! - `worker` - фоновое назначение по сигналу об изменениях.

pub mod hub;
pub mod locks;
pub mod worker;

pub use hub::SessionHub;
pub use locks::{KeyedLocks, LockKey, LockSet};
pub use worker::{spawn_assignment_worker, AssignmentWorker};

use serde::{Deserialize, Serialize};

use crate::domain::ConfigError;

/// Настройки рантайма.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Потолок на обработку одного интента целиком (блокировки + запись).
    pub intent_timeout_ms: u64,
    /// Потолок на захват блокировок.
    pub lock_timeout_ms: u64,
    /// Сколько раз повторяем запись при конфликте версий.
    pub max_commit_retries: u32,
    /// Как часто воркер назначения просыпается без сигнала.
    #[serde(default = "default_worker_tick_ms")]
    pub worker_tick_ms: u64,
}

fn default_worker_tick_ms() -> u64 {
    1_000
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            intent_timeout_ms: 2_000,
            lock_timeout_ms: 500,
            max_commit_retries: 5,
            worker_tick_ms: default_worker_tick_ms(),
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.intent_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "RuntimeConfig: intent_timeout_ms = 0".into(),
            ));
        }
        if self.lock_timeout_ms == 0 || self.lock_timeout_ms > self.intent_timeout_ms {
            return Err(ConfigError::Invalid(
                "RuntimeConfig: lock_timeout_ms must be in 1..=intent_timeout_ms".into(),
            ));
        }
        if self.worker_tick_ms == 0 {
            return Err(ConfigError::Invalid("RuntimeConfig: worker_tick_ms = 0".into()));
        }
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: RuntimeConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
