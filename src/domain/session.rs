// src/domain/session.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Тип игры.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameType {
    Singles,
    Doubles,
}

impl GameType {
    /// Сколько игроков нужно на один матч.
    pub fn players_per_match(self) -> usize {
        match self {
            GameType::Singles => 2,
            GameType::Doubles => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameType::Singles => "singles",
            GameType::Doubles => "doubles",
        }
    }
}

/// Статус сессии.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Closed,
    Archived,
}

/// Режим очереди.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum QueueMode {
    /// Корты заполняет движок назначения.
    Auto,
    /// Матчи создаёт только тренер (override).
    Manual,
}

/// Веса балансировки: уровень vs возраст.
///
/// По умолчанию 80/20. Сумма весов должна быть 1.0,
/// тогда итоговый скор лежит в [0, 1].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct BalanceWeights {
    pub skill: f64,
    pub age: f64,
}

impl BalanceWeights {
    pub const DEFAULT: BalanceWeights = BalanceWeights {
        skill: 0.8,
        age: 0.2,
    };

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.skill) || !(0.0..=1.0).contains(&self.age) {
            return Err("BalanceWeights: weights must be in [0, 1]".into());
        }
        if ((self.skill + self.age) - 1.0).abs() > 1e-9 {
            return Err("BalanceWeights: skill + age must equal 1.0".into());
        }
        Ok(())
    }
}

impl Default for BalanceWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Конфигурация сессии.
///
/// Для ядра только чтение: меняют её административные коллабораторы.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub name: String,
    pub status: SessionStatus,
    pub queue_mode: QueueMode,
    pub game_type: GameType,
    /// До скольких очков играется гейм (попадает в policy матча).
    pub score_to: u32,
    /// Взнос в центах. 0 = бесплатная сессия, оплата не нужна.
    pub entry_fee_cents: u64,
    pub currency: String,
    /// Сколько раундов назначения игрок пропускает после матча.
    pub cooldown_games: u32,
    /// Максимум игр подряд. Хранится для коллабораторов, ядро его не применяет.
    pub max_consecutive: u32,
    /// Сколько кортов поднять при старте сессии.
    pub court_count: u32,
    #[serde(default)]
    pub balance: BalanceWeights,
}

impl SessionConfig {
    /// Удобный пресет: парные игры до 21, без взноса, кулдаун 1 раунд.
    pub fn doubles_free(court_count: u32) -> Self {
        Self {
            name: "Open Play".to_string(),
            status: SessionStatus::Open,
            queue_mode: QueueMode::Auto,
            game_type: GameType::Doubles,
            score_to: 21,
            entry_fee_cents: 0,
            currency: "PHP".to_string(),
            cooldown_games: 1,
            max_consecutive: 2,
            court_count,
            balance: BalanceWeights::DEFAULT,
        }
    }

    pub fn players_per_match(&self) -> usize {
        self.game_type.players_per_match()
    }

    pub fn payment_required(&self) -> bool {
        self.entry_fee_cents > 0
    }

    /// Жёсткая валидация конфига сессии.
    pub fn validate_full(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("SessionConfig: name is empty".into()));
        }

        if self.court_count == 0 {
            return Err(ConfigError::Invalid(
                "SessionConfig: court_count = 0".into(),
            ));
        }

        if self.score_to == 0 {
            return Err(ConfigError::Invalid("SessionConfig: score_to = 0".into()));
        }

        if self.payment_required() && self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "SessionConfig: entry fee set but currency is empty".into(),
            ));
        }

        self.balance.validate().map_err(ConfigError::Invalid)?;

        Ok(())
    }

    /// Загрузить конфиг из JSON (файл конфигурации или payload админки).
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: SessionConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate_full()?;
        Ok(cfg)
    }
}

/// Реквизиты e-wallet.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EWallet {
    pub account_number: String,
    pub qr_url: Option<String>,
}

/// Настройки оплаты.
///
/// Принадлежат внешнему коллаборатору и передаются в процессор интентов
/// при каждом вызове, ядро их не хранит.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentConfig {
    pub amount_cents: u64,
    pub currency: String,
    /// Способ оплаты → реквизиты. Пусто = способ не проверяем.
    #[serde(default)]
    pub e_wallets: BTreeMap<String, EWallet>,
}

impl PaymentConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn accepts_method(&self, method: &str) -> bool {
        self.e_wallets.is_empty() || self.e_wallets.contains_key(method)
    }
}

/// Ошибки конфигурации.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Cannot parse config: {0}")]
    Parse(String),
}
