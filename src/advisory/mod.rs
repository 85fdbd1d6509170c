//! Советник по составам (только чтение).
//!
//! Предлагает группировки игроков для запросившего участника.
//! Никогда не меняет состояние, а его ошибка не блокирует основные операции:
//! `suggest_or_empty` логирует сбой и возвращает пустой список.

use thiserror::Error;
use tracing::warn;

use crate::domain::{is_valid_level, GameType, ParticipantId};

/// Игрок, доступный для подсказки.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdvisoryPlayer {
    pub participant_id: ParticipantId,
    pub level: u8,
    pub age: u32,
}

/// Запрос к советнику.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdvisoryRequest {
    pub requester_id: ParticipantId,
    pub requester_level: u8,
    /// Ожидающие игроки в порядке очереди (без запросившего).
    pub available: Vec<AdvisoryPlayer>,
    pub game_type: GameType,
}

/// Предложенный состав: запросивший + партнёры/соперники.
#[derive(Clone, Debug, PartialEq)]
pub struct Suggestion {
    pub players: Vec<ParticipantId>,
    /// Разброс уровней внутри состава.
    pub spread: f64,
    pub rationale: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdvisoryError {
    #[error("Invalid advisory request: {0}")]
    InvalidRequest(String),

    #[error("Advisor unavailable: {0}")]
    Unavailable(String),
}

/// Источник подсказок.
pub trait MatchAdvisor: Send + Sync {
    fn suggest(&self, request: &AdvisoryRequest) -> Result<Vec<Suggestion>, AdvisoryError>;
}

/// Подсказки или пустой список, если советник упал.
pub fn suggest_or_empty(advisor: &dyn MatchAdvisor, request: &AdvisoryRequest) -> Vec<Suggestion> {
    match advisor.suggest(request) {
        Ok(list) => list,
        Err(e) => {
            warn!(
                requester_id = request.requester_id.as_str(),
                error = %e,
                "advisory failed, returning no suggestions"
            );
            Vec::new()
        }
    }
}

/// Локальный советник: игроки в полосе уровня вокруг запросившего.
///
/// Детерминирован: ближайшие по уровню идут первыми, при равенстве - порядок очереди.
#[derive(Clone, Debug)]
pub struct SkillBandAdvisor {
    /// Допустимая разница уровней (±band).
    pub band: u8,
    pub max_suggestions: usize,
}

impl Default for SkillBandAdvisor {
    fn default() -> Self {
        Self {
            band: 1,
            max_suggestions: 3,
        }
    }
}

impl MatchAdvisor for SkillBandAdvisor {
    fn suggest(&self, request: &AdvisoryRequest) -> Result<Vec<Suggestion>, AdvisoryError> {
        if !is_valid_level(request.requester_level) {
            return Err(AdvisoryError::InvalidRequest(format!(
                "requester level {} out of range",
                request.requester_level
            )));
        }

        let others_needed = request.game_type.players_per_match() - 1;
        let lvl = request.requester_level;

        let mut in_band: Vec<(u8, usize, &AdvisoryPlayer)> = request
            .available
            .iter()
            .enumerate()
            .filter(|(_, p)| p.participant_id != request.requester_id)
            .map(|(order, p)| (p.level.abs_diff(lvl), order, p))
            .filter(|(diff, _, _)| *diff <= self.band)
            .collect();
        in_band.sort_by_key(|(diff, order, _)| (*diff, *order));

        let suggestions = in_band
            .chunks_exact(others_needed)
            .take(self.max_suggestions)
            .map(|chunk| {
                let mut players = Vec::with_capacity(others_needed + 1);
                players.push(request.requester_id.clone());
                players.extend(chunk.iter().map(|(_, _, p)| p.participant_id.clone()));

                let levels = chunk.iter().map(|(_, _, p)| p.level).chain(std::iter::once(lvl));
                let (lo, hi) = levels.fold((u8::MAX, u8::MIN), |(lo, hi), l| (lo.min(l), hi.max(l)));

                Suggestion {
                    players,
                    spread: f64::from(hi - lo),
                    rationale: format!(
                        "{} game, levels {lo}-{hi} within ±{} of level {lvl}",
                        request.game_type.as_str(),
                        self.band
                    ),
                }
            })
            .collect();

        Ok(suggestions)
    }
}
