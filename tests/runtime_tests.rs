// tests/runtime_tests.rs
//
// Асинхронный слой: SessionHub, ключевые блокировки, воркер назначения.
//
// Проверяем:
//  1) дубль интента через хаб не пишет новую версию;
//  2) конфликт версии повторяется, исчерпание повторов -> retryable ошибка;
//  3) зависшая запись упирается в таймаут интента;
//  4) воркер назначает по сигналу, без тика;
//  5) параллельные игроки не попадают в два матча сразу.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use badminton_engine::advisory::SkillBandAdvisor;
use badminton_engine::api::{
    AdminCommand, ApiError, CommandResponse, Intent, IntentKind, IntentReceipt, Query,
    QueryResponse, RegisterPayload,
};
use badminton_engine::domain::{CourtStatus, PaymentConfig, SessionConfig};
use badminton_engine::engine::{EngineError, SessionEngine};
use badminton_engine::infra::{
    DeterministicRng, IdGenerator, InMemorySessionStore, ManualClock, RandomSource, SessionStore,
};
use badminton_engine::runtime::{
    spawn_assignment_worker, KeyedLocks, LockKey, RuntimeConfig, SessionHub,
};
use badminton_engine::state::SessionSnapshot;

// ----------------------
// helpers
// ----------------------

/// Хранилище, которое первые `conflicts` записей отклоняет конфликтом версии.
struct FlakyStore {
    inner: InMemorySessionStore,
    conflicts: AtomicU32,
}

impl FlakyStore {
    fn new(courts: u32, conflicts: u32) -> Self {
        Self {
            inner: store(courts),
            conflicts: AtomicU32::new(conflicts),
        }
    }
}

impl SessionStore for FlakyStore {
    fn load(&self) -> Result<SessionSnapshot, EngineError> {
        self.inner.load()
    }

    fn commit(&self, snapshot: SessionSnapshot) -> Result<u64, EngineError> {
        let left = self.conflicts.load(Ordering::SeqCst);
        if left > 0 {
            self.conflicts.store(left - 1, Ordering::SeqCst);
            return Err(EngineError::ConcurrentModification {
                expected: snapshot.version,
                found: snapshot.version + 1,
            });
        }
        self.inner.commit(snapshot)
    }
}

fn store(courts: u32) -> InMemorySessionStore {
    let engine = SessionEngine::new(SessionConfig::doubles_free(courts)).unwrap();
    InMemorySessionStore::new(SessionSnapshot::new(engine))
}

fn hub_with(store: Arc<dyn SessionStore>, config: RuntimeConfig) -> Arc<SessionHub> {
    Arc::new(SessionHub::new(store, Arc::new(ManualClock::new(1_000)), config).unwrap())
}

fn register(nickname: &str) -> IntentKind {
    IntentKind::Register(RegisterPayload {
        nickname: nickname.to_string(),
        level: 4,
        age: 30,
    })
}

/// Повторять тот же интент, пока хаб отвечает retryable-ошибкой.
async fn submit_until_done(hub: &SessionHub, intent: Intent) -> IntentReceipt {
    let payment = PaymentConfig::default();
    for _ in 0..100 {
        match hub.submit(intent.clone(), &payment).await {
            Ok(receipt) => return receipt,
            Err(e) if e.is_retryable() => tokio::task::yield_now().await,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    panic!("intent {} never went through", intent.id);
}

/// Регистрация, правила, очередь.
async fn join(hub: &SessionHub, ids: &IdGenerator, pid: &str) {
    for kind in [register(pid), IntentKind::AgreeToTerms, IntentKind::Enqueue] {
        let intent = Intent::new(ids.next_intent_id(), pid, kind, 1_000);
        let receipt = submit_until_done(hub, intent).await;
        assert!(receipt.is_applied(), "{receipt:?}");
    }
}

async fn wait_for_open_matches(hub: &SessionHub, expected: usize) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let open = hub.snapshot().unwrap().engine.open_matches().count();
            if open >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "expected {expected} open matches");
}

// ----------------------
// Идемпотентность и ответы
// ----------------------

#[tokio::test]
async fn duplicate_intent_through_hub_does_not_write_again() {
    let store = Arc::new(store(1));
    let hub = hub_with(store.clone(), RuntimeConfig::default());
    let payment = PaymentConfig::default();

    let intent = Intent::new("reg-1", "p1", register("Ana"), 1_000);
    let first = hub.submit(intent.clone(), &payment).await.unwrap();
    assert_eq!(store.version().unwrap(), 1);

    let second = hub.submit(intent, &payment).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(store.version().unwrap(), 1);
}

#[tokio::test]
async fn business_rejection_is_a_receipt() {
    let hub = hub_with(Arc::new(store(1)), RuntimeConfig::default());

    let receipt = hub
        .submit(
            Intent::new("q-1", "ghost", IntentKind::Enqueue, 1_000),
            &PaymentConfig::default(),
        )
        .await
        .unwrap();

    assert!(!receipt.is_applied());
    assert_eq!(receipt.error_code.as_deref(), Some("participant_not_found"));
}

#[tokio::test]
async fn admin_and_queries_go_through_hub() {
    let hub = hub_with(Arc::new(store(2)), RuntimeConfig::default());
    let ids = IdGenerator::new("t");

    let err = hub
        .admin(AdminCommand::StartMatch { match_id: 99 })
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::MatchNotFound(99));

    match hub
        .admin(AdminCommand::SetCourtStatus {
            court_id: 2,
            status: CourtStatus::Down,
        })
        .await
        .unwrap()
    {
        CommandResponse::CourtState(court) => assert_eq!(court.status, "down"),
        other => panic!("unexpected response: {other:?}"),
    }

    for pid in ["a", "b", "c", "d"] {
        join(&hub, &ids, pid).await;
    }
    match hub.admin(AdminCommand::RunAssignment).await.unwrap() {
        CommandResponse::Assigned(list) => {
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].court_id, 1);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    match hub
        .query(&Query::GetSession, &SkillBandAdvisor::default())
        .unwrap()
    {
        QueryResponse::Session(view) => {
            assert_eq!(view.active_matches, 1);
            assert_eq!(view.waiting, 0);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

// ----------------------
// Конфликты и таймауты
// ----------------------

#[tokio::test]
async fn commit_conflicts_are_retried() {
    let store = Arc::new(FlakyStore::new(1, 2));
    let hub = hub_with(store.clone(), RuntimeConfig::default());

    let receipt = hub
        .submit(
            Intent::new("reg-1", "p1", register("Ana"), 1_000),
            &PaymentConfig::default(),
        )
        .await
        .unwrap();

    assert!(receipt.is_applied());
    assert_eq!(store.inner.version().unwrap(), 1);
}

#[tokio::test]
async fn exhausted_retries_leave_intent_resendable() {
    let store = Arc::new(FlakyStore::new(1, 10));
    let config = RuntimeConfig {
        max_commit_retries: 2,
        ..RuntimeConfig::default()
    };
    let hub = hub_with(store.clone(), config);
    let intent = Intent::new("reg-1", "p1", register("Ana"), 1_000);
    let payment = PaymentConfig::default();

    let err = hub.submit(intent.clone(), &payment).await.unwrap_err();
    assert!(matches!(err, EngineError::ConcurrentModification { .. }));
    assert!(ApiError::from(err).is_retryable());

    let snapshot = hub.snapshot().unwrap();
    assert_eq!(snapshot.version, 0);
    assert!(snapshot.processor.receipt("reg-1").is_none());

    store.conflicts.store(0, Ordering::SeqCst);
    let receipt = hub.submit(intent, &payment).await.unwrap();
    assert!(receipt.is_applied());
}

#[tokio::test]
async fn endless_conflicts_hit_intent_timeout() {
    let store = Arc::new(FlakyStore::new(1, u32::MAX));
    let config = RuntimeConfig {
        intent_timeout_ms: 50,
        lock_timeout_ms: 10,
        max_commit_retries: u32::MAX,
        ..RuntimeConfig::default()
    };
    let hub = hub_with(store, config);

    let err = hub
        .submit(
            Intent::new("reg-1", "p1", register("Ana"), 1_000),
            &PaymentConfig::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::Timeout {
            operation: "intent reg-1".into(),
            after_ms: 50
        }
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn overlapping_lock_sets_do_not_deadlock() {
    let locks = Arc::new(KeyedLocks::new());

    let mut tasks = Vec::new();
    for n in 0..8u64 {
        let locks = locks.clone();
        tasks.push(tokio::spawn(async move {
            // Разный порядок ключей в запросе, одинаковый порядок захвата.
            let keys = if n % 2 == 0 {
                vec![LockKey::Participant("a".into()), LockKey::Court(1), LockKey::Match(7)]
            } else {
                vec![LockKey::Match(7), LockKey::Court(1), LockKey::Participant("a".into())]
            };
            let set = locks.acquire(keys, 1_000).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
            set.keys().to_vec()
        }));
    }

    for task in tasks {
        let keys = task.await.unwrap();
        assert_eq!(
            keys,
            vec![LockKey::Court(1), LockKey::Match(7), LockKey::Participant("a".into())]
        );
    }
    // Все наборы отпущены: таблица ключей пуста.
    assert!(locks.is_empty());
}

#[test]
fn runtime_config_rejects_bad_timeouts() {
    let bad = RuntimeConfig {
        lock_timeout_ms: 5_000,
        intent_timeout_ms: 1_000,
        ..RuntimeConfig::default()
    };
    let engine = SessionEngine::new(SessionConfig::doubles_free(1)).unwrap();
    let store: Arc<dyn SessionStore> =
        Arc::new(InMemorySessionStore::new(SessionSnapshot::new(engine)));

    let err = SessionHub::new(store, Arc::new(ManualClock::new(0)), bad).err();
    assert!(matches!(err, Some(EngineError::InvalidConfig(_))));
}

// ----------------------
// Воркер назначения
// ----------------------

#[tokio::test]
async fn worker_assigns_on_change_signal() {
    let config = RuntimeConfig {
        worker_tick_ms: 60_000,
        ..RuntimeConfig::default()
    };
    let hub = hub_with(Arc::new(store(1)), config);
    let mut changes = hub.subscribe();
    let worker = spawn_assignment_worker(hub.clone());
    let ids = IdGenerator::new("w");

    for pid in ["a", "b", "c", "d"] {
        join(&hub, &ids, pid).await;
    }
    assert!(changes.has_changed().unwrap());

    wait_for_open_matches(&hub, 1).await;

    let snapshot = hub.snapshot().unwrap();
    let m = snapshot.engine.open_matches().next().unwrap();
    assert_eq!(m.players, vec!["a", "b", "c", "d"]);
    assert!(snapshot.engine.queue.is_empty());

    hub.shutdown();
    tokio::time::timeout(Duration::from_secs(1), worker)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_players_are_never_double_assigned() {
    const COURTS: u32 = 3;
    const PLAYERS: usize = 14;

    let config = RuntimeConfig {
        worker_tick_ms: 20,
        ..RuntimeConfig::default()
    };
    let hub = hub_with(Arc::new(store(COURTS)), config);
    let worker = spawn_assignment_worker(hub.clone());
    let ids = Arc::new(IdGenerator::new("c"));

    let mut roster: Vec<String> = (0..PLAYERS).map(|n| format!("p{n:02}")).collect();
    DeterministicRng::from_seed(7).shuffle(&mut roster);

    let mut tasks = Vec::new();
    for pid in roster {
        let hub = hub.clone();
        let ids = ids.clone();
        tasks.push(tokio::spawn(async move { join(&hub, &ids, &pid).await }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    wait_for_open_matches(&hub, COURTS as usize).await;
    hub.shutdown();
    worker.await.unwrap();

    let engine = hub.snapshot().unwrap().engine;
    let mut busy = BTreeSet::new();
    let mut courts = BTreeSet::new();
    for m in engine.open_matches() {
        assert!(courts.insert(m.court_id), "court {} used twice", m.court_id);
        for pid in &m.players {
            assert!(busy.insert(pid.clone()), "{pid} double-assigned");
            assert!(!engine.queue.has_active(pid));
        }
    }
    assert_eq!(busy.len(), COURTS as usize * 4);
    assert_eq!(engine.queue.waiting_count(), PLAYERS - busy.len());
    assert_eq!(engine.participants.len(), PLAYERS);
}
