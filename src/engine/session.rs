// src/engine/session.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    Court, CourtId, Match, MatchId, Participant, ParticipantId, SessionConfig, SessionStatus,
    Timestamp,
};
use crate::engine::courts::CourtRegistry;
use crate::engine::errors::EngineError;
use crate::engine::queue::SessionQueue;

/// Полное состояние одной open-play сессии:
/// - участники;
/// - очередь;
/// - корты;
/// - матчи (включая завершённые, для истории).
///
/// Все операции синхронные и работают через `&mut self`,
/// параллелизм и повторы живут уровнем выше (`runtime`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionEngine {
    pub config: SessionConfig,
    pub participants: BTreeMap<ParticipantId, Participant>,
    pub queue: SessionQueue,
    pub courts: CourtRegistry,
    pub matches: BTreeMap<MatchId, Match>,
    pub next_match_id: MatchId,
    /// Сколько раундов назначения прошло (каждый созданный матч = раунд).
    pub assignment_rounds: u64,
    pub total_matches_completed: u64,
}

impl SessionEngine {
    /// Новая сессия с `config.court_count` кортами.
    pub fn new(config: SessionConfig) -> Result<Self, EngineError> {
        config.validate_full()?;
        let courts = CourtRegistry::provision(config.court_count);

        info!(
            session = config.name.as_str(),
            courts = config.court_count,
            game_type = config.game_type.as_str(),
            "session created"
        );

        Ok(Self {
            config,
            participants: BTreeMap::new(),
            queue: SessionQueue::new(),
            courts,
            matches: BTreeMap::new(),
            next_match_id: 1,
            assignment_rounds: 0,
            total_matches_completed: 0,
        })
    }

    pub fn players_per_match(&self) -> usize {
        self.config.players_per_match()
    }

    pub fn is_open(&self) -> bool {
        self.config.status == SessionStatus::Open
    }

    pub fn ensure_open(&self) -> Result<(), EngineError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(EngineError::invalid_state(format!(
                "session '{}' is not open",
                self.config.name
            )))
        }
    }

    pub fn participant(&self, participant_id: &str) -> Result<&Participant, EngineError> {
        self.participants
            .get(participant_id)
            .ok_or_else(|| EngineError::ParticipantNotFound {
                participant_id: participant_id.to_string(),
            })
    }

    pub fn participant_mut(&mut self, participant_id: &str) -> Result<&mut Participant, EngineError> {
        self.participants
            .get_mut(participant_id)
            .ok_or_else(|| EngineError::ParticipantNotFound {
                participant_id: participant_id.to_string(),
            })
    }

    pub fn court(&self, court_id: CourtId) -> Result<&Court, EngineError> {
        self.courts
            .get(court_id)
            .ok_or(EngineError::CourtNotFound { court_id })
    }

    pub fn get_match(&self, match_id: MatchId) -> Result<&Match, EngineError> {
        self.matches
            .get(&match_id)
            .ok_or(EngineError::MatchNotFound { match_id })
    }

    /// Открытый (scheduled/active) матч, в котором сейчас участник.
    pub fn open_match_for(&self, participant_id: &str) -> Option<&Match> {
        self.matches
            .values()
            .find(|m| m.status.is_open() && m.has_player(participant_id))
    }

    /// Открытые матчи.
    pub fn open_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.values().filter(|m| m.status.is_open())
    }

    /// Зарегистрировать участника или обновить профиль.
    ///
    /// Профиль нельзя менять, пока участник в очереди или в матче:
    /// уровень участвует в балансе.
    pub fn upsert_participant(
        &mut self,
        participant_id: &str,
        nickname: String,
        level: u8,
        age: u32,
        now_ts: Timestamp,
    ) -> Result<bool, EngineError> {
        if self.queue.has_active(participant_id) || self.open_match_for(participant_id).is_some() {
            return Err(EngineError::invalid_state(format!(
                "participant {participant_id} cannot change profile while queued or playing"
            )));
        }

        match self.participants.get_mut(participant_id) {
            Some(existing) => {
                existing.nickname = nickname;
                existing.level = level;
                existing.age = age;
                Ok(false)
            }
            None => {
                let p = Participant::new(participant_id.to_string(), nickname, level, age, now_ts);
                self.participants.insert(participant_id.to_string(), p);
                Ok(true)
            }
        }
    }

    pub fn allocate_match_id(&mut self) -> MatchId {
        let id = self.next_match_id;
        self.next_match_id += 1;
        id
    }
}
