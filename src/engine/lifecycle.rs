// src/engine/lifecycle.rs
//! Жизненный цикл матча:
//!
//!   scheduled → active → completed
//!        \         \
//!         → canceled ←
//!
//! Только этот модуль меняет статус матча и переводит корт
//! в `Playing` / обратно.

use tracing::info;

use crate::domain::{
    CourtId, CourtStatus, Match, MatchCreator, MatchId, MatchPolicy, MatchStatus, ParticipantId,
    RoundEffect, Timestamp,
};
use crate::engine::errors::EngineError;
use crate::engine::session::SessionEngine;

/// Как стартует новый матч.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStart {
    /// Сразу `Active` (авто-назначение и override тренера).
    Immediately,
    /// `Scheduled`: тренер подготовил матч, стартует отдельной командой.
    Scheduled,
}

/// Итог завершения матча.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedMatch {
    pub match_id: MatchId,
    pub court_id: CourtId,
    pub court_status: CourtStatus,
    pub players: Vec<ParticipantId>,
}

/// Создать матч на корте.
///
/// Проверки (до любых изменений):
///   - ровно `players_per_match` игроков;
///   - корт свободен;
///   - все игроки зарегистрированы и ждут в очереди.
///
/// Затем атомарно: очередь → assigned (→ playing → удалены),
/// корт → playing, матч создан.
pub fn create_match(
    session: &mut SessionEngine,
    court_id: CourtId,
    players: &[ParticipantId],
    created_by: MatchCreator,
    start: MatchStart,
    now_ts: Timestamp,
) -> Result<MatchId, EngineError> {
    let required = session.players_per_match();

    // 1. Состав.
    if players.len() < required {
        return Err(EngineError::InsufficientPlayers {
            required,
            available: players.len(),
        });
    }
    if players.len() > required {
        return Err(EngineError::InvalidPayload(format!(
            "match needs exactly {required} players, got {}",
            players.len()
        )));
    }

    // 2. Корт.
    let court = session.court(court_id)?;
    if !court.is_idle() || court.pending_down {
        return Err(EngineError::CourtUnavailable { court_id });
    }

    // 3. Игроки.
    for pid in players {
        session.participant(pid)?;
    }

    // 4. Очередь: проверяет всех и только потом меняет.
    session.queue.mark_assigned(players)?;

    let snapshot: Vec<_> = players
        .iter()
        .filter_map(|pid| session.queue.get(pid).cloned())
        .collect();

    let match_id = session.allocate_match_id();
    session.courts.attach_match(court_id, match_id)?;

    let (status, started_at) = match start {
        MatchStart::Immediately => {
            session.queue.mark_playing(players)?;
            session.queue.remove(players);
            (MatchStatus::Active, Some(now_ts))
        }
        MatchStart::Scheduled => (MatchStatus::Scheduled, None),
    };

    let m = Match {
        id: match_id,
        court_id,
        players: players.to_vec(),
        status,
        created_at: now_ts,
        started_at,
        ended_at: None,
        created_by,
        policy: MatchPolicy {
            game_type: session.config.game_type,
            score_to: session.config.score_to,
        },
        queue_snapshot: snapshot,
        round: None,
    };

    info!(
        match_id,
        court_id,
        status = status.as_str(),
        created_by = %m.created_by.label(),
        players = ?m.players,
        "match created"
    );

    session.matches.insert(match_id, m);
    if status == MatchStatus::Active {
        let effect = advance_round(session, players);
        match_mut(session, match_id)?.round = Some(effect);
    }

    Ok(match_id)
}

/// Стартовать подготовленный матч (`Scheduled → Active`).
pub fn start_match(
    session: &mut SessionEngine,
    match_id: MatchId,
    now_ts: Timestamp,
) -> Result<(), EngineError> {
    let players = {
        let m = session.get_match(match_id)?;
        if m.status != MatchStatus::Scheduled {
            return Err(EngineError::invalid_state(format!(
                "match {match_id} is {}, expected scheduled",
                m.status.as_str()
            )));
        }
        m.players.clone()
    };

    session.queue.mark_playing(&players)?;
    session.queue.remove(&players);

    let effect = advance_round(session, &players);
    let m = match_mut(session, match_id)?;
    m.status = MatchStatus::Active;
    m.started_at = Some(now_ts);
    m.round = Some(effect);

    info!(match_id, "match started");
    Ok(())
}

/// Завершить матч. Только из `Active`.
///
/// Единственное место, где пишется `ended_at`. Игроки получают кулдаун,
/// но обратно в очередь сами не встают.
pub fn complete_match(
    session: &mut SessionEngine,
    match_id: MatchId,
    now_ts: Timestamp,
) -> Result<CompletedMatch, EngineError> {
    let (court_id, players) = {
        let m = session.get_match(match_id)?;
        if m.status != MatchStatus::Active {
            return Err(EngineError::invalid_state(format!(
                "match {match_id} not active (status: {})",
                m.status.as_str()
            )));
        }
        (m.court_id, m.players.clone())
    };

    let court_status = session.courts.detach_match(court_id)?;

    let cooldown = session.config.cooldown_games;
    for pid in &players {
        if let Some(p) = session.participants.get_mut(pid) {
            p.cooldown = cooldown;
            p.last_match_ended_at = Some(now_ts);
            p.games_played = p.games_played.saturating_add(1);
        }
    }

    let m = match_mut(session, match_id)?;
    m.status = MatchStatus::Completed;
    m.ended_at = Some(now_ts);

    session.total_matches_completed += 1;

    info!(
        match_id,
        court_id,
        court_status = court_status.as_str(),
        "match completed"
    );

    Ok(CompletedMatch {
        match_id,
        court_id,
        court_status,
        players,
    })
}

/// Отменить матч (`Scheduled` или `Active`).
///
/// Игроки возвращаются в начало очереди в исходном порядке, корт освобождается.
/// Раунд кулдауна, засчитанный стартом матча, откатывается.
pub fn cancel_match(session: &mut SessionEngine, match_id: MatchId) -> Result<(), EngineError> {
    let (court_id, players, status, snapshot, round) = {
        let m = session.get_match(match_id)?;
        if !m.status.is_open() {
            return Err(EngineError::invalid_state(format!(
                "match {match_id} cannot be canceled from {}",
                m.status.as_str()
            )));
        }
        (
            m.court_id,
            m.players.clone(),
            m.status,
            m.queue_snapshot.clone(),
            m.round.clone(),
        )
    };

    if status == MatchStatus::Scheduled {
        // Игроки ещё висят в очереди как assigned.
        session.queue.remove(&players);
    }
    session.queue.reinsert_front(snapshot)?;
    session.courts.detach_match(court_id)?;

    if let Some(effect) = round {
        revert_round(session, effect);
    }

    let m = match_mut(session, match_id)?;
    m.status = MatchStatus::Canceled;
    m.round = None;

    info!(match_id, court_id, "match canceled, players returned to queue front");
    Ok(())
}

fn match_mut(session: &mut SessionEngine, match_id: MatchId) -> Result<&mut Match, EngineError> {
    session
        .matches
        .get_mut(&match_id)
        .ok_or(EngineError::MatchNotFound { match_id })
}

/// Новый раунд назначения: у всех, кто не попал в матч, кулдаун уменьшается.
/// Выбранным игрокам кулдаун обнуляется (их либо выбрали без кулдауна,
/// либо кулдаун сняли из-за нехватки игроков).
///
/// Раунд засчитывается только матчу, который реально стартовал.
fn advance_round(session: &mut SessionEngine, selected: &[ParticipantId]) -> RoundEffect {
    session.assignment_rounds += 1;

    let mut effect = RoundEffect::default();
    for p in session.participants.values_mut() {
        if selected.contains(&p.id) {
            effect.selected_cooldowns.push((p.id.clone(), p.cooldown));
            p.cooldown = 0;
        } else if p.cooldown > 0 {
            effect.decremented.push(p.id.clone());
            p.cooldown -= 1;
        }
    }
    effect
}

/// Откат раунда отменённого матча.
///
/// Кулдаун не поднимается выше `cooldown_games`: если игрок успел доиграть
/// другой матч, его кулдаун уже свежий.
fn revert_round(session: &mut SessionEngine, effect: RoundEffect) {
    session.assignment_rounds = session.assignment_rounds.saturating_sub(1);

    let cap = session.config.cooldown_games;
    for (pid, cooldown) in effect.selected_cooldowns {
        if let Some(p) = session.participants.get_mut(&pid) {
            p.cooldown = cooldown;
        }
    }
    for pid in effect.decremented {
        if let Some(p) = session.participants.get_mut(&pid) {
            p.cooldown = p.cooldown.saturating_add(1).min(cap);
        }
    }
}
