// tests/config_tests.rs
//
// Конфигурация: сессия, оплата, рантайм. Загрузка из JSON + валидация.

use badminton_engine::domain::{
    BalanceWeights, ConfigError, GameType, PaymentConfig, QueueMode, SessionConfig,
};
use badminton_engine::engine::{EngineError, SessionEngine};
use badminton_engine::runtime::RuntimeConfig;

//
// ---------- SessionConfig ----------
//

#[test]
fn session_config_from_json_uses_default_balance() {
    let raw = r#"{
        "name": "Sunday Doubles",
        "status": "Open",
        "queue_mode": "Auto",
        "game_type": "Doubles",
        "score_to": 21,
        "entry_fee_cents": 15000,
        "currency": "PHP",
        "cooldown_games": 1,
        "max_consecutive": 2,
        "court_count": 3
    }"#;

    let cfg = SessionConfig::from_json_str(raw).unwrap();

    assert_eq!(cfg.name, "Sunday Doubles");
    assert_eq!(cfg.queue_mode, QueueMode::Auto);
    assert_eq!(cfg.game_type, GameType::Doubles);
    assert_eq!(cfg.players_per_match(), 4);
    assert!(cfg.payment_required());
    assert_eq!(cfg.balance, BalanceWeights::DEFAULT);
}

#[test]
fn session_config_rejects_broken_json() {
    let err = SessionConfig::from_json_str("{ \"name\": ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn session_config_validation_rules() {
    let ok = SessionConfig::doubles_free(2);
    assert!(ok.validate_full().is_ok());
    assert!(!ok.payment_required());

    let mut no_courts = ok.clone();
    no_courts.court_count = 0;
    assert!(matches!(no_courts.validate_full(), Err(ConfigError::Invalid(_))));

    let mut blank = ok.clone();
    blank.name = "  ".into();
    assert!(blank.validate_full().is_err());

    let mut zero_score = ok.clone();
    zero_score.score_to = 0;
    assert!(zero_score.validate_full().is_err());

    let mut fee_without_currency = ok.clone();
    fee_without_currency.entry_fee_cents = 100;
    fee_without_currency.currency = String::new();
    assert!(fee_without_currency.validate_full().is_err());

    let mut weights = ok;
    weights.balance = BalanceWeights {
        skill: 0.7,
        age: 0.7,
    };
    assert!(weights.validate_full().is_err());
}

#[test]
fn invalid_config_cannot_start_a_session() {
    let mut cfg = SessionConfig::doubles_free(1);
    cfg.court_count = 0;

    let err = SessionEngine::new(cfg).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfig(_)));
}

#[test]
fn session_starts_with_idle_courts() {
    let s = SessionEngine::new(SessionConfig::doubles_free(3)).unwrap();

    assert_eq!(s.courts.len(), 3);
    assert_eq!(s.courts.list_idle(), vec![1, 2, 3]);
    assert!(s.queue.is_empty());
    assert!(s.matches.is_empty());
}

//
// ---------- PaymentConfig ----------
//

#[test]
fn payment_config_lists_accepted_wallets() {
    let raw = r#"{
        "amount_cents": 20000,
        "currency": "PHP",
        "e_wallets": {
            "gcash": { "account_number": "0917-000-0000", "qr_url": null },
            "maya": { "account_number": "0918-000-0000", "qr_url": "https://pay.example/qr" }
        }
    }"#;

    let cfg = PaymentConfig::from_json_str(raw).unwrap();

    assert_eq!(cfg.amount_cents, 20_000);
    assert!(cfg.accepts_method("gcash"));
    assert!(cfg.accepts_method("maya"));
    assert!(!cfg.accepts_method("cash"));
}

#[test]
fn payment_config_without_wallets_accepts_any_method() {
    let cfg = PaymentConfig::from_json_str(r#"{ "amount_cents": 0, "currency": "" }"#).unwrap();

    assert!(cfg.e_wallets.is_empty());
    assert!(cfg.accepts_method("anything"));
}

//
// ---------- RuntimeConfig ----------
//

#[test]
fn runtime_config_defaults_are_valid() {
    let cfg = RuntimeConfig::default();
    assert!(cfg.validate().is_ok());
    assert!(cfg.lock_timeout_ms <= cfg.intent_timeout_ms);
}

#[test]
fn runtime_config_from_json_fills_worker_tick() {
    let cfg = RuntimeConfig::from_json_str(
        r#"{ "intent_timeout_ms": 3000, "lock_timeout_ms": 250, "max_commit_retries": 8 }"#,
    )
    .unwrap();

    assert_eq!(cfg.intent_timeout_ms, 3_000);
    assert_eq!(cfg.max_commit_retries, 8);
    assert_eq!(cfg.worker_tick_ms, 1_000);
}

#[test]
fn runtime_config_rejects_zero_timeouts() {
    let err = RuntimeConfig::from_json_str(
        r#"{ "intent_timeout_ms": 0, "lock_timeout_ms": 0, "max_commit_retries": 1 }"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let tick = RuntimeConfig {
        worker_tick_ms: 0,
        ..RuntimeConfig::default()
    };
    assert!(tick.validate().is_err());
}
