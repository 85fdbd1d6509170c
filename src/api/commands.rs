use serde::{Deserialize, Serialize};

use crate::domain::{CourtId, CourtStatus, IntentId, MatchId, ParticipantId, Timestamp};

/// Статус интента.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntentStatus {
    New,
    Applied,
    Rejected,
}

/// Интент - идемпотентный запрос клиента на изменение состояния сессии.
///
/// `id` - ключ идемпотентности: повторная отправка того же интента
/// возвращает тот же результат и ничего не меняет.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Intent {
    pub id: IntentId,
    /// Кто отправил (client id игрока или id тренера/QM).
    pub participant_id: ParticipantId,
    pub kind: IntentKind,
    pub status: IntentStatus,
    pub created_at: Timestamp,
}

impl Intent {
    pub fn new(
        id: impl Into<IntentId>,
        participant_id: impl Into<ParticipantId>,
        kind: IntentKind,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            participant_id: participant_id.into(),
            kind,
            status: IntentStatus::New,
            created_at,
        }
    }
}

/// Тип интента + payload.
///
/// `ConfirmPayment`, `CoachOverrideAssign`, `CompleteMatch` требуют
/// повышенных прав. Права проверяет вызывающий коллаборатор.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntentKind {
    /// Регистрация (или обновление профиля).
    Register(RegisterPayload),

    /// Принять правила сессии.
    AgreeToTerms,

    /// Отправить оплату на подтверждение.
    SubmitPayment(SubmitPaymentPayload),

    /// QM подтверждает оплату участника.
    ConfirmPayment { target_participant_id: ParticipantId },

    /// Встать в очередь.
    Enqueue,

    /// Выйти из очереди (только пока ждёшь).
    LeaveQueue,

    /// Вернуться в очередь после матча.
    RequeueAfterMatch,

    /// Тренер сам назначает состав на корт.
    CoachOverrideAssign(CoachOverridePayload),

    /// Завершить матч (тренер/QM).
    CompleteMatch { match_id: MatchId },
}

impl IntentKind {
    /// Имя типа в wire-формате (`register`, `enqueue`, ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            IntentKind::Register(_) => "register",
            IntentKind::AgreeToTerms => "agree_to_terms",
            IntentKind::SubmitPayment(_) => "submit_payment",
            IntentKind::ConfirmPayment { .. } => "confirm_payment",
            IntentKind::Enqueue => "enqueue",
            IntentKind::LeaveQueue => "leave_queue",
            IntentKind::RequeueAfterMatch => "requeue_after_match",
            IntentKind::CoachOverrideAssign(_) => "coach_override_assign",
            IntentKind::CompleteMatch { .. } => "complete_match",
        }
    }

    /// Меняет ли интент очередь или корты так, что стоит прогнать назначение.
    pub fn wakes_assignment(&self) -> bool {
        matches!(
            self,
            IntentKind::Enqueue | IntentKind::RequeueAfterMatch | IntentKind::CompleteMatch { .. }
        )
    }

    pub fn requires_elevated(&self) -> bool {
        matches!(
            self,
            IntentKind::ConfirmPayment { .. }
                | IntentKind::CoachOverrideAssign(_)
                | IntentKind::CompleteMatch { .. }
        )
    }
}

/// Payload регистрации.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterPayload {
    pub nickname: String,
    /// Уровень 1–7 (из самооценки или выбранный вручную).
    pub level: u8,
    pub age: u32,
}

/// Payload оплаты.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitPaymentPayload {
    pub amount_cents: u64,
    pub currency: String,
    /// Способ оплаты (e-wallet).
    pub method: String,
    /// Короткий референс платежа (например, 6 символов).
    pub payment_ref: String,
}

/// Payload override тренера.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoachOverridePayload {
    pub court_id: CourtId,
    pub player_ids: Vec<ParticipantId>,
}

/// Административные команды (не интенты игроков).
///
/// Идут от QM/админки, права уже проверены снаружи.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AdminCommand {
    /// Перевести корт в idle/down. Down для занятого корта откладывается.
    SetCourtStatus { court_id: CourtId, status: CourtStatus },

    /// Тренер готовит матч (status = scheduled), старт отдельно.
    PrepareMatch {
        coach_id: ParticipantId,
        court_id: CourtId,
        player_ids: Vec<ParticipantId>,
    },

    /// Стартовать подготовленный матч.
    StartMatch { match_id: MatchId },

    /// Отменить матч: игроки возвращаются в начало очереди.
    CancelMatch { match_id: MatchId },

    /// Явно прогнать проход назначения.
    RunAssignment,
}

impl AdminCommand {
    pub fn wakes_assignment(&self) -> bool {
        matches!(
            self,
            AdminCommand::SetCourtStatus { .. } | AdminCommand::CancelMatch { .. }
        )
    }
}
