// src/engine/assignment.rs
//! Движок назначения: свободные корты + очередь → матчи.
//!
//! Проход идемпотентен: каждый созданный матч сразу убирает своих игроков
//! из ожидания, поэтому повторный вызов на том же состоянии ничего не делает.

use tracing::{debug, info, warn};

use crate::domain::{CourtId, MatchCreator, MatchId, Participant, ParticipantId, QueueMode, Timestamp};
use crate::engine::errors::EngineError;
use crate::engine::lifecycle::{create_match, MatchStart};
use crate::engine::scoring::score_candidates;
use crate::engine::selector::select_group;
use crate::engine::session::SessionEngine;

/// Пул кандидатов на ближайший раунд.
#[derive(Clone, Debug)]
pub struct EligiblePool<'a> {
    /// Кандидаты в порядке очереди.
    pub candidates: Vec<&'a Participant>,
    /// Кулдаун снят, потому что игроков без кулдауна слишком мало.
    pub cooldown_waived: bool,
}

/// Что сделал один проход назначения.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    /// Созданные матчи: (корт, матч).
    pub created: Vec<(CourtId, MatchId)>,
    pub idle_courts_left: usize,
    pub waiting_left: usize,
    /// В каком-то раунде прохода кулдаун был снят.
    pub cooldown_waived: bool,
}

impl AssignmentReport {
    pub fn is_quiescent(&self) -> bool {
        self.created.is_empty()
    }
}

/// Кандидаты из ожидающих игроков с учётом кулдауна.
///
/// Правило: если игроков без кулдауна хватает на матч (`>= players_per_match`),
/// берём только их. Иначе кулдаун снимаем для всех, чтобы корт не простаивал.
/// Очередь из `cooldown_games + players_per_match` ожидающих кулдаун не снимает,
/// пока среди них набирается полный состав свежих.
pub fn eligible_pool(session: &SessionEngine) -> EligiblePool<'_> {
    let waiting: Vec<&Participant> = session
        .queue
        .waiting()
        .filter_map(|item| session.participants.get(&item.participant_id))
        .collect();

    let fresh: Vec<&Participant> = waiting
        .iter()
        .copied()
        .filter(|p| !p.is_cooling_down())
        .collect();

    if fresh.len() >= session.players_per_match() || fresh.len() == waiting.len() {
        EligiblePool {
            candidates: fresh,
            cooldown_waived: false,
        }
    } else {
        EligiblePool {
            candidates: waiting,
            cooldown_waived: true,
        }
    }
}

/// Выбрать следующую группу для матча (без изменений состояния).
///
/// `None` - игроков не хватает, это нормальное состояние.
pub fn pick_next_group(
    session: &SessionEngine,
) -> Result<Option<(Vec<ParticipantId>, bool)>, EngineError> {
    let k = session.players_per_match();
    let pool = eligible_pool(session);

    if pool.candidates.len() < k {
        return Ok(None);
    }

    let scored = score_candidates(&pool.candidates, session.config.balance)?;
    let mut group = select_group(&scored, k);
    if group.is_empty() {
        return Ok(None);
    }

    // Порядок игроков в матче - порядок очереди.
    group.sort_by_key(|c| c.queue_order);
    let players = group.into_iter().map(|c| c.participant_id).collect();

    Ok(Some((players, pool.cooldown_waived)))
}

/// Один проход назначения по всем свободным кортам.
///
/// Ошибок наружу не отдаёт: "нет кортов" и "мало игроков" - штатная тишина.
pub fn run_assignment_cycle(session: &mut SessionEngine, now_ts: Timestamp) -> AssignmentReport {
    let mut report = AssignmentReport::default();

    if session.config.queue_mode == QueueMode::Manual || !session.is_open() {
        debug!("assignment: skipped (manual mode or session not open)");
        report.idle_courts_left = session.courts.list_idle().len();
        report.waiting_left = session.queue.waiting_count();
        return report;
    }

    // Корты обходим в стабильном порядке (по id).
    for court_id in session.courts.list_idle() {
        let next = match pick_next_group(session) {
            Ok(Some(next)) => next,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "assignment: cannot score candidates, pass stopped");
                break;
            }
        };
        let (players, waived) = next;

        match create_match(
            session,
            court_id,
            &players,
            MatchCreator::System,
            MatchStart::Immediately,
            now_ts,
        ) {
            Ok(match_id) => {
                report.created.push((court_id, match_id));
                report.cooldown_waived |= waived;
            }
            Err(e) => {
                warn!(court_id, error = %e, "assignment: match creation failed");
            }
        }
    }

    report.idle_courts_left = session.courts.list_idle().len();
    report.waiting_left = session.queue.waiting_count();

    if !report.created.is_empty() {
        info!(
            created = report.created.len(),
            idle_courts_left = report.idle_courts_left,
            waiting_left = report.waiting_left,
            "assignment pass done"
        );
    }

    report
}

/// Override тренера: явный состав, без скоринга.
///
/// Проверяется только доступность: корт свободен, игроки ждут в очереди.
pub fn coach_override_assign(
    session: &mut SessionEngine,
    court_id: CourtId,
    players: &[ParticipantId],
    coach_id: &str,
    start: MatchStart,
    now_ts: Timestamp,
) -> Result<MatchId, EngineError> {
    create_match(
        session,
        court_id,
        players,
        MatchCreator::Coach(coach_id.to_string()),
        start,
        now_ts,
    )
}
