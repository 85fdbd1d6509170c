use crate::domain::{ConfigError, CourtId, MatchId, ParticipantId};

use thiserror::Error;

/// Ошибки движка сессии.
///
/// Валидационные ошибки (неверный статус, не хватает игроков) терминальны
/// для интента. `ConcurrentModification` и `Timeout` можно повторить.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Participant {participant_id} is already in the queue")]
    AlreadyQueued { participant_id: ParticipantId },

    #[error("Participant {participant_id} is not waiting in the queue")]
    NotQueued { participant_id: ParticipantId },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not enough players: required {required}, available {available}")]
    InsufficientPlayers { required: usize, available: usize },

    #[error("Court {court_id} is not available")]
    CourtUnavailable { court_id: CourtId },

    #[error("State was modified concurrently (expected version {expected}, found {found}), retry")]
    ConcurrentModification { expected: u64, found: u64 },

    #[error("Operation '{operation}' timed out after {after_ms} ms, retry")]
    Timeout { operation: String, after_ms: u64 },

    #[error("Participant {participant_id} is not registered")]
    ParticipantNotFound { participant_id: ParticipantId },

    #[error("Court {court_id} not found")]
    CourtNotFound { court_id: CourtId },

    #[error("Match {match_id} not found")]
    MatchNotFound { match_id: MatchId },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("{0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Можно ли повторить операцию без изменения входа.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::ConcurrentModification { .. } | EngineError::Timeout { .. }
        )
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        EngineError::InvalidState(msg.into())
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::InvalidConfig(e.to_string())
    }
}
