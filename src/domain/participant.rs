use serde::{Deserialize, Serialize};

use crate::domain::{ParticipantId, Timestamp};

/// Минимальный и максимальный уровень игры (шкала 1–7).
pub const MIN_SKILL_LEVEL: u8 = 1;
pub const MAX_SKILL_LEVEL: u8 = 7;

/// Участник сессии.
///
/// Создаётся интентом `register` и живёт до конца сессии (не удаляется).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub nickname: String,
    /// Уровень игры 1–7.
    pub level: u8,
    pub age: u32,

    /// Прошёл регистрацию (всегда true после `register`).
    pub registered: bool,
    /// Принял правила сессии.
    pub agreed_to_terms: bool,
    /// Отправил оплату, ждёт подтверждения QM.
    pub payment_submitted: bool,
    /// Оплата подтверждена.
    pub paid: bool,
    /// Референс платежа, который прислал игрок.
    pub payment_ref: Option<String>,
    /// Способ оплаты (e-wallet), если указан.
    pub payment_method: Option<String>,

    /// Сколько раундов назначения игрок ещё должен пропустить.
    pub cooldown: u32,
    /// Когда закончился его последний матч.
    pub last_match_ended_at: Option<Timestamp>,
    /// Сколько матчей сыграно за сессию.
    pub games_played: u32,
    pub registered_at: Timestamp,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        nickname: String,
        level: u8,
        age: u32,
        now_ts: Timestamp,
    ) -> Self {
        Self {
            id,
            nickname,
            level,
            age,
            registered: true,
            agreed_to_terms: false,
            payment_submitted: false,
            paid: false,
            payment_ref: None,
            payment_method: None,
            cooldown: 0,
            last_match_ended_at: None,
            games_played: 0,
            registered_at: now_ts,
        }
    }

    /// Может ли участник встать в очередь с точки зрения регистрации/оплаты.
    ///
    /// `payment_required` = false для бесплатных сессий.
    pub fn is_cleared_to_play(&self, payment_required: bool) -> bool {
        self.registered && self.agreed_to_terms && (!payment_required || self.paid)
    }

    /// Находится ли игрок в кулдауне после матча.
    pub fn is_cooling_down(&self) -> bool {
        self.cooldown > 0
    }
}

/// Проверка уровня на границе (интенты, скоринг).
pub fn is_valid_level(level: u8) -> bool {
    (MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).contains(&level)
}
