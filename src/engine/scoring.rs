// src/engine/scoring.rs
//! Скоринг баланса: композитный скор по уровню и возрасту.

use crate::domain::{is_valid_level, BalanceWeights, Participant, ParticipantId};
use crate::engine::errors::EngineError;

/// Кандидат с посчитанным скором.
///
/// `queue_order` - позиция в очереди (0 = ждёт дольше всех),
/// нужна для стабильного тай-брейка в селекторе.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCandidate {
    pub participant_id: ParticipantId,
    pub queue_order: usize,
    pub level: u8,
    pub age: u32,
    pub score: f64,
}

/// Посчитать скор для каждого кандидата.
///
/// Кандидаты передаются в порядке очереди.
///
/// Формула:
///   levelNorm = level / maxLevel
///   ageNorm   = age / maxAge
///   score     = w.skill * levelNorm + w.age * (1 - ageNorm)
///
/// Молодые и сильные получают более высокий скор.
pub fn score_candidates(
    candidates: &[&Participant],
    weights: BalanceWeights,
) -> Result<Vec<ScoredCandidate>, EngineError> {
    if candidates.is_empty() {
        return Err(EngineError::InvalidPayload(
            "balance scorer needs at least one candidate".into(),
        ));
    }

    for p in candidates {
        if !is_valid_level(p.level) {
            return Err(EngineError::InvalidPayload(format!(
                "participant {} has level {} outside [1, 7]",
                p.id, p.level
            )));
        }
        if p.age == 0 {
            return Err(EngineError::InvalidPayload(format!(
                "participant {} has age 0",
                p.id
            )));
        }
    }

    // max >= 1 гарантирован проверками выше.
    let max_level = candidates.iter().map(|p| p.level).max().unwrap_or(1).max(1) as f64;
    let max_age = candidates.iter().map(|p| p.age).max().unwrap_or(1).max(1) as f64;

    let scored = candidates
        .iter()
        .enumerate()
        .map(|(queue_order, p)| {
            let level_norm = p.level as f64 / max_level;
            let age_norm = p.age as f64 / max_age;
            let score = weights.skill * level_norm + weights.age * (1.0 - age_norm);

            ScoredCandidate {
                participant_id: p.id.clone(),
                queue_order,
                level: p.level,
                age: p.age,
                score,
            }
        })
        .collect();

    Ok(scored)
}
