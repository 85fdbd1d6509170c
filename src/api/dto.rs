use serde::{Deserialize, Serialize};

use crate::domain::{CourtId, IntentId, MatchId, ParticipantId, Timestamp};

use super::commands::IntentStatus;

/// DTO участника.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(async_graphql::SimpleObject))]
pub struct ParticipantDto {
    pub participant_id: ParticipantId,
    pub nickname: String,
    pub level: u8,
    pub age: u32,
    pub agreed_to_terms: bool,
    pub payment_submitted: bool,
    pub paid: bool,
    pub cooldown: u32,
    pub games_played: u32,
    pub last_match_ended_at: Option<Timestamp>,
    /// "waiting" / "assigned" / "playing", если участник в очереди.
    pub queue_status: Option<String>,
    /// Открытый матч участника, если есть.
    pub current_match_id: Option<MatchId>,
}

/// Одна позиция очереди.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(async_graphql::SimpleObject))]
pub struct QueueEntryDto {
    /// Позиция, начиная с 1.
    pub position: u32,
    pub participant_id: ParticipantId,
    pub nickname: String,
    pub level: u8,
    pub status: String,
    pub priority: i64,
    pub enqueued_at: Timestamp,
    pub cooldown: u32,
}

/// DTO корта.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(async_graphql::SimpleObject))]
pub struct CourtViewDto {
    pub court_id: CourtId,
    pub name: String,
    /// "idle" / "playing" / "down".
    pub status: String,
    pub current_match_id: Option<MatchId>,
    pub pending_down: bool,
}

/// DTO матча.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(async_graphql::SimpleObject))]
pub struct MatchViewDto {
    pub match_id: MatchId,
    pub court_id: CourtId,
    pub players: Vec<ParticipantId>,
    /// "scheduled" / "active" / "completed" / "canceled".
    pub status: String,
    pub created_by: String,
    pub game_type: String,
    pub score_to: u32,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
}

/// Обзор сессии (минимальное представление для лобби).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(async_graphql::SimpleObject))]
pub struct SessionViewDto {
    pub name: String,
    /// "open" / "closed" / "archived".
    pub status: String,
    /// "auto" / "manual".
    pub queue_mode: String,
    pub game_type: String,
    pub players_per_match: u32,
    pub participants: u32,
    pub waiting: u32,
    pub idle_courts: u32,
    pub active_matches: u32,
    pub assignment_rounds: u64,
    pub total_matches_completed: u64,
}

/// Предложение состава от советника.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SuggestionDto {
    pub players: Vec<ParticipantId>,
    pub spread: f64,
    pub rationale: String,
}

/// Ответ API на команду.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandResponse {
    /// Успешный результат без доп.данных.
    Ok,

    /// Участник зарегистрирован / профиль обновлён.
    Participant(ParticipantDto),

    /// Участник встал в очередь.
    Queued(QueueEntryDto),

    /// Создан матч (override тренера или подготовка).
    MatchCreated(MatchViewDto),

    /// Состояние матча после старта / отмены.
    MatchState(MatchViewDto),

    /// Матч завершён.
    MatchCompleted {
        r#match: MatchViewDto,
        court: CourtViewDto,
    },

    /// Состояние корта после админской команды.
    CourtState(CourtViewDto),

    /// Результат прохода назначения: созданные матчи.
    Assigned(Vec<MatchViewDto>),
}

/// Квитанция по интенту. Хранится по `intent_id` для идемпотентности.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntentReceipt {
    pub intent_id: IntentId,
    pub status: IntentStatus,
    /// Причина отказа (для `Rejected`).
    pub reason: Option<String>,
    /// Машинный код ошибки (для `Rejected`).
    pub error_code: Option<String>,
    pub response: Option<CommandResponse>,
}

impl IntentReceipt {
    pub fn applied(intent_id: IntentId, response: CommandResponse) -> Self {
        Self {
            intent_id,
            status: IntentStatus::Applied,
            reason: None,
            error_code: None,
            response: Some(response),
        }
    }

    pub fn rejected(intent_id: IntentId, code: &str, reason: String) -> Self {
        Self {
            intent_id,
            status: IntentStatus::Rejected,
            reason: Some(reason),
            error_code: Some(code.to_string()),
            response: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == IntentStatus::Applied
    }
}
