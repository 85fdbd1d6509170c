// src/runtime/hub.rs
//! SessionHub - асинхронная точка входа в сессию.
//!
//! Поток интента:
//!   1. блокировки по ключам из payload (участник, корт, матч), с таймаутом;
//!   2. загрузка снапшота → обработка → запись с ожидаемой версией;
//!      конфликт версии → повтор до `max_commit_retries`;
//!   3. весь вызов ограничен `intent_timeout_ms`;
//!   4. изменение очереди / кортов → сигнал в `watch`-канал.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::advisory::MatchAdvisor;
use crate::api::{
    answer_query, apply_admin, AdminCommand, ApiError, CommandResponse, Intent, IntentKind,
    IntentReceipt, Query, QueryResponse,
};
use crate::domain::PaymentConfig;
use crate::engine::{run_assignment_cycle, AssignmentReport, EngineError};
use crate::infra::{Clock, SessionStore};
use crate::state::SessionSnapshot;

use super::locks::{KeyedLocks, LockKey};
use super::RuntimeConfig;

pub struct SessionHub {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks,
    config: RuntimeConfig,
    /// Версия последней записи, которая может разбудить назначение.
    changes: watch::Sender<u64>,
    shutdown: watch::Sender<bool>,
}

impl SessionHub {
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        config: RuntimeConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let version = store.load()?.version;
        let (changes, _) = watch::channel(version);
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            store,
            clock,
            locks: KeyedLocks::new(),
            config,
            changes,
            shutdown,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Подписка на изменения, которые влияют на назначение.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Попросить фоновые задачи остановиться.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Текущий снапшот (только чтение).
    pub fn snapshot(&self) -> Result<SessionSnapshot, EngineError> {
        self.store.load()
    }

    pub fn query(
        &self,
        query: &Query,
        advisor: &dyn MatchAdvisor,
    ) -> Result<QueryResponse, ApiError> {
        let snapshot = self.store.load()?;
        answer_query(&snapshot.engine, query, advisor)
    }

    /// Обработать интент.
    ///
    /// `Err` только для конфликтов/таймаутов (интент можно повторить)
    /// и внутренних ошибок. Отказ по бизнес-правилам - это квитанция `Rejected`.
    pub async fn submit(
        &self,
        intent: Intent,
        payment: &PaymentConfig,
    ) -> Result<IntentReceipt, EngineError> {
        let keys = intent_lock_keys(&intent);
        let operation = format!("intent {}", intent.id);

        let work = async {
            let _locks = self.locks.acquire(keys, self.config.lock_timeout_ms).await?;

            self.commit_with_retry(&operation, |snapshot| {
                let before = snapshot.processor.receipts_len();
                let receipt = snapshot
                    .processor
                    .process(&mut snapshot.engine, &intent, payment);
                let changed = snapshot.processor.receipts_len() != before;
                Ok((receipt, changed))
            })
            .await
        };

        let (receipt, version) = self.bounded(&operation, work).await?;

        if let Some(version) = version {
            if receipt.is_applied() && intent.kind.wakes_assignment() {
                self.notify(version);
            }
        }
        Ok(receipt)
    }

    /// Выполнить админ-команду через тот же путь записи.
    pub async fn admin(&self, cmd: AdminCommand) -> Result<CommandResponse, ApiError> {
        let keys = admin_lock_keys(&cmd);
        let operation = format!("admin {cmd:?}");
        let now_ts = self.clock.now_ts();

        let work = async {
            let _locks = self.locks.acquire(keys, self.config.lock_timeout_ms).await?;

            self.commit_with_retry(&operation, |snapshot| {
                match apply_admin(&mut snapshot.engine, &cmd, now_ts) {
                    Ok(resp) => Ok((Ok(resp), true)),
                    Err(e) => Ok((Err(e), false)),
                }
            })
            .await
        };

        let (result, version) = self.bounded(&operation, work).await?;
        let response = result?;

        if let Some(version) = version {
            if cmd.wakes_assignment() {
                self.notify(version);
            }
        }
        Ok(response)
    }

    /// Один проход назначения: блокируем свободные корты, пишем оптимистично.
    pub async fn run_assignment_pass(&self) -> Result<AssignmentReport, EngineError> {
        let idle = self.store.load()?.engine.courts.list_idle();
        if idle.is_empty() {
            return Ok(AssignmentReport::default());
        }

        let keys = idle.into_iter().map(LockKey::Court).collect();
        let operation = "assignment pass".to_string();
        let now_ts = self.clock.now_ts();

        let work = async {
            let _locks = self.locks.acquire(keys, self.config.lock_timeout_ms).await?;

            self.commit_with_retry(&operation, |snapshot| {
                let report = run_assignment_cycle(&mut snapshot.engine, now_ts);
                let changed = !report.created.is_empty();
                Ok((report, changed))
            })
            .await
        };

        let (report, _) = self.bounded(&operation, work).await?;
        Ok(report)
    }

    /// Загрузить → изменить → записать; при конфликте версии повторить.
    ///
    /// `apply` возвращает результат и флаг "есть что записывать".
    /// Результат: значение + новая версия (если была запись).
    async fn commit_with_retry<T>(
        &self,
        operation: &str,
        mut apply: impl FnMut(&mut SessionSnapshot) -> Result<(T, bool), EngineError>,
    ) -> Result<(T, Option<u64>), EngineError> {
        let mut last_err = None;

        for attempt in 0..=self.config.max_commit_retries {
            let mut snapshot = self.store.load()?;
            let (out, changed) = apply(&mut snapshot)?;

            if !changed {
                return Ok((out, None));
            }

            match self.store.commit(snapshot) {
                Ok(version) => {
                    debug!(operation, attempt, version, "committed");
                    return Ok((out, Some(version)));
                }
                Err(e) if e.is_retryable() => {
                    warn!(operation, attempt, error = %e, "commit conflict, retrying");
                    last_err = Some(e);
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| EngineError::Internal(format!("{operation}: no attempts"))))
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        work: impl std::future::Future<Output = Result<T, EngineError>>,
    ) -> Result<T, EngineError> {
        let limit = self.config.intent_timeout_ms;
        match timeout(Duration::from_millis(limit), work).await {
            Ok(res) => res,
            Err(_) => {
                warn!(operation, after_ms = limit, "operation timed out");
                Err(EngineError::Timeout {
                    operation: operation.to_string(),
                    after_ms: limit,
                })
            }
        }
    }

    fn notify(&self, version: u64) {
        info!(version, "session changed, waking assignment");
        self.changes.send_replace(version);
    }
}

/// Ключи блокировок для интента: автор + корт/матч/цель из payload.
pub fn intent_lock_keys(intent: &Intent) -> Vec<LockKey> {
    let mut keys = vec![LockKey::Participant(intent.participant_id.clone())];

    match &intent.kind {
        IntentKind::ConfirmPayment {
            target_participant_id,
        } => keys.push(LockKey::Participant(target_participant_id.clone())),
        IntentKind::CoachOverrideAssign(payload) => {
            keys.push(LockKey::Court(payload.court_id));
            keys.extend(payload.player_ids.iter().cloned().map(LockKey::Participant));
        }
        IntentKind::CompleteMatch { match_id } => keys.push(LockKey::Match(*match_id)),
        _ => {}
    }

    keys
}

fn admin_lock_keys(cmd: &AdminCommand) -> Vec<LockKey> {
    match cmd {
        AdminCommand::SetCourtStatus { court_id, .. } => vec![LockKey::Court(*court_id)],
        AdminCommand::PrepareMatch {
            court_id,
            player_ids,
            ..
        } => std::iter::once(LockKey::Court(*court_id))
            .chain(player_ids.iter().cloned().map(LockKey::Participant))
            .collect(),
        AdminCommand::StartMatch { match_id } | AdminCommand::CancelMatch { match_id } => {
            vec![LockKey::Match(*match_id)]
        }
        AdminCommand::RunAssignment => Vec::new(),
    }
}
