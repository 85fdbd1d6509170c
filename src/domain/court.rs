use serde::{Deserialize, Serialize};

use crate::domain::{CourtId, MatchId};

/// Статус корта.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CourtStatus {
    Idle,
    Playing,
    /// Корт выключен администратором, назначать на него нельзя.
    Down,
}

impl CourtStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CourtStatus::Idle => "idle",
            CourtStatus::Playing => "playing",
            CourtStatus::Down => "down",
        }
    }
}

/// Корт.
///
/// Инварианты:
/// - `Playing` ⇔ `current_match_id.is_some()`;
/// - `Down` ⇒ `current_match_id.is_none()`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Court {
    pub id: CourtId,
    pub name: String,
    pub status: CourtStatus,
    pub current_match_id: Option<MatchId>,
    /// Запрошен перевод в `Down`, пока на корте идёт матч.
    /// Применяется при завершении/отмене матча.
    pub pending_down: bool,
}

impl Court {
    pub fn new(id: CourtId, name: String) -> Self {
        Self {
            id,
            name,
            status: CourtStatus::Idle,
            current_match_id: None,
            pending_down: false,
        }
    }

    /// Свободен ли корт для нового матча.
    pub fn is_idle(&self) -> bool {
        self.status == CourtStatus::Idle && self.current_match_id.is_none()
    }
}
