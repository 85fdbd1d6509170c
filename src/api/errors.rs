use serde::{Deserialize, Serialize};

use crate::domain::{CourtId, MatchId, ParticipantId};
use crate::engine::EngineError;

/// Ошибки внешнего API (то, что отдаём клиенту).
///
/// Каждая несёт человекочитаемую причину.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApiError {
    /// Неправильные входные данные (битый payload, уровень вне 1–7 и т.п.).
    BadRequest(String),

    /// Участник не зарегистрирован.
    ParticipantNotFound(ParticipantId),

    CourtNotFound(CourtId),

    MatchNotFound(MatchId),

    /// Команда не может быть выполнена в текущем состоянии
    /// (уже в очереди, матч не активен, корт занят, мало игроков...).
    Rejected { code: String, reason: String },

    /// Конфликт или таймаут - можно повторить тот же интент.
    Retryable { code: String, reason: String },

    /// Внутренняя ошибка.
    Internal(String),
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Retryable { .. })
    }

    /// Стабильный машинный код ошибки.
    pub fn code(&self) -> &str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::ParticipantNotFound(_) => "participant_not_found",
            ApiError::CourtNotFound(_) => "court_not_found",
            ApiError::MatchNotFound(_) => "match_not_found",
            ApiError::Rejected { code, .. } | ApiError::Retryable { code, .. } => code,
            ApiError::Internal(_) => "internal",
        }
    }

    /// Причина для показа пользователю.
    pub fn reason(&self) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg.clone(),
            ApiError::ParticipantNotFound(id) => format!("Participant {id} is not registered"),
            ApiError::CourtNotFound(id) => format!("Court {id} not found"),
            ApiError::MatchNotFound(id) => format!("Match {id} not found"),
            ApiError::Rejected { reason, .. } | ApiError::Retryable { reason, .. } => reason.clone(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let reason = err.to_string();
        match err {
            EngineError::InvalidPayload(msg) | EngineError::InvalidConfig(msg) => {
                ApiError::BadRequest(msg)
            }
            EngineError::ParticipantNotFound { participant_id } => {
                ApiError::ParticipantNotFound(participant_id)
            }
            EngineError::CourtNotFound { court_id } => ApiError::CourtNotFound(court_id),
            EngineError::MatchNotFound { match_id } => ApiError::MatchNotFound(match_id),
            EngineError::AlreadyQueued { .. } => rejected("already_queued", reason),
            EngineError::NotQueued { .. } => rejected("not_queued", reason),
            EngineError::InvalidState(_) => rejected("invalid_state", reason),
            EngineError::InsufficientPlayers { .. } => rejected("insufficient_players", reason),
            EngineError::CourtUnavailable { .. } => rejected("court_unavailable", reason),
            EngineError::ConcurrentModification { .. } => ApiError::Retryable {
                code: "concurrent_modification".into(),
                reason,
            },
            EngineError::Timeout { .. } => ApiError::Retryable {
                code: "timeout".into(),
                reason,
            },
            EngineError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

fn rejected(code: &str, reason: String) -> ApiError {
    ApiError::Rejected {
        code: code.to_string(),
        reason,
    }
}
