use serde::{Deserialize, Serialize};

use crate::domain::session::GameType;
use crate::domain::{CourtId, MatchId, ParticipantId, QueueItem, Timestamp};

/// Статус матча.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchStatus {
    /// Матч подготовлен тренером, но ещё не стартовал.
    Scheduled,
    Active,
    Completed,
    Canceled,
}

impl MatchStatus {
    /// Матч держит корт и игроков.
    pub fn is_open(self) -> bool {
        matches!(self, MatchStatus::Scheduled | MatchStatus::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Active => "active",
            MatchStatus::Completed => "completed",
            MatchStatus::Canceled => "canceled",
        }
    }
}

/// Кто создал матч.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchCreator {
    /// Автоматическое назначение (`system:auto`).
    System,
    /// Тренер / QM через override.
    Coach(ParticipantId),
}

impl MatchCreator {
    pub fn label(&self) -> String {
        match self {
            MatchCreator::System => "system:auto".to_string(),
            MatchCreator::Coach(id) => id.clone(),
        }
    }
}

/// Снимок политики на момент создания матча.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchPolicy {
    pub game_type: GameType,
    pub score_to: u32,
}

/// След раунда кулдауна, который засчитал этот матч.
///
/// Пишется, когда матч становится `Active`. Отмена матча откатывает его.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEffect {
    /// Кулдаун игроков матча до раунда.
    pub selected_cooldowns: Vec<(ParticipantId, u32)>,
    /// Кому раунд уменьшил кулдаун.
    pub decremented: Vec<ParticipantId>,
}

/// Матч на корте.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Match {
    pub id: MatchId,
    pub court_id: CourtId,
    /// Игроки матча. Размер = `game_type.players_per_match()`, не меняется.
    pub players: Vec<ParticipantId>,
    pub status: MatchStatus,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    /// Пишет только завершение матча.
    pub ended_at: Option<Timestamp>,
    pub created_by: MatchCreator,
    pub policy: MatchPolicy,

    /// Элементы очереди игроков в том виде, в каком они были до назначения.
    /// Нужны, чтобы при отмене вернуть игроков в их исходном порядке.
    pub queue_snapshot: Vec<QueueItem>,

    /// Засчитанный раунд кулдауна. `None`, пока матч не стартовал.
    #[serde(default)]
    pub round: Option<RoundEffect>,
}

impl Match {
    pub fn has_player(&self, participant_id: &str) -> bool {
        self.players.iter().any(|p| p == participant_id)
    }
}
