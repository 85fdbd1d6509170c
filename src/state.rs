use linera_sdk::views::{linera_views, MapView, RegisterView, RootView, ViewStorageContext};
use serde::{Deserialize, Serialize};

use crate::api::{IntentProcessor, IntentReceipt};
use crate::domain::{Court, CourtId, IntentId, Match, MatchId, Participant, ParticipantId, SessionConfig};
use crate::engine::{SessionEngine, SessionQueue};

/// Снэпшот сессии, который можно хранить целиком.
/// Это «замороженная» сессия: движок + журнал квитанций + версия
/// для оптимистичной записи.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    /// Растёт на 1 при каждой успешной записи.
    pub version: u64,
    pub engine: SessionEngine,
    pub processor: IntentProcessor,
}

impl SessionSnapshot {
    /// Новый снапшот версии 0 с пустым журналом.
    pub fn new(engine: SessionEngine) -> Self {
        Self {
            version: 0,
            engine,
            processor: IntentProcessor::new(),
        }
    }
}

/// Глобальное состояние приложения сессии на Linera.
///
/// Важное:
/// - НЕ вкладываем RegisterView внутрь MapView.
/// - Участники, корты и матчи лежат отдельными записями,
///   очередь целиком (её порядок - одна сущность).
#[derive(RootView)]
#[view(context = ViewStorageContext)]
pub struct BadmintonState {
    /// Конфиг сессии (None до инициализации).
    #[view(register)]
    pub config: RegisterView<Option<SessionConfig>>,

    /// Участники: ParticipantId -> Participant.
    #[view(map)]
    pub participants: MapView<ParticipantId, Participant>,

    /// Очередь с приоритетами.
    #[view(register)]
    pub queue: RegisterView<SessionQueue>,

    #[view(map)]
    pub courts: MapView<CourtId, Court>,

    /// Все матчи сессии, включая завершённые.
    #[view(map)]
    pub matches: MapView<MatchId, Match>,

    /// Квитанции интентов (идемпотентность).
    #[view(map)]
    pub receipts: MapView<IntentId, IntentReceipt>,

    #[view(register)]
    pub next_match_id: RegisterView<MatchId>,

    /// Статистика: раунды назначения и завершённые матчи.
    #[view(register)]
    pub assignment_rounds: RegisterView<u64>,

    #[view(register)]
    pub total_matches_completed: RegisterView<u64>,

    /// Версия для оптимистичной записи.
    #[view(register)]
    pub version: RegisterView<u64>,
}
