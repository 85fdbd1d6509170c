// tests/engine_lifecycle_tests.rs
//
// Жизненный цикл матча: create / start / complete / cancel,
// корты (pending down), override тренера.

use badminton_engine::domain::{
    CourtStatus, MatchCreator, MatchStatus, ParticipantId, QueueStatus, SessionConfig, Timestamp,
};
use badminton_engine::engine::{
    cancel_match, coach_override_assign, complete_match, create_match, run_assignment_cycle,
    start_match, CourtStatusChange, EngineError, MatchStart, SessionEngine,
};

fn doubles_session(courts: u32) -> SessionEngine {
    SessionEngine::new(SessionConfig::doubles_free(courts)).unwrap()
}

fn join(session: &mut SessionEngine, id: &str, now: Timestamp) {
    session
        .upsert_participant(id, id.to_string(), 4, 30, now)
        .unwrap();
    session.participant_mut(id).unwrap().agreed_to_terms = true;
    session.queue.enqueue(id, now).unwrap();
}

fn ids(list: &[&str]) -> Vec<ParticipantId> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Сессия с одним активным матчем на корте 1: a, b, c, d; e ждёт.
fn session_with_active_match() -> (SessionEngine, u64) {
    let mut s = doubles_session(1);
    for (n, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        join(&mut s, id, n as Timestamp + 1);
    }
    let report = run_assignment_cycle(&mut s, 10);
    let match_id = report.created[0].1;
    (s, match_id)
}

// ----------------------
// complete
// ----------------------

#[test]
fn complete_frees_court_and_sets_player_stats() {
    let (mut s, match_id) = session_with_active_match();

    let done = complete_match(&mut s, match_id, 50).unwrap();

    assert_eq!(done.court_status, CourtStatus::Idle);
    assert_eq!(done.players, ids(&["a", "b", "c", "d"]));

    let m = s.get_match(match_id).unwrap();
    assert_eq!(m.status, MatchStatus::Completed);
    assert_eq!(m.ended_at, Some(50));

    let court = s.court(1).unwrap();
    assert_eq!(court.status, CourtStatus::Idle);
    assert_eq!(court.current_match_id, None);

    for pid in ["a", "b", "c", "d"] {
        let p = s.participant(pid).unwrap();
        assert_eq!(p.cooldown, 1);
        assert_eq!(p.last_match_ended_at, Some(50));
        assert_eq!(p.games_played, 1);
        // Автоматически в очередь не возвращаем.
        assert!(!s.queue.has_active(pid));
    }
    assert_eq!(s.total_matches_completed, 1);
}

#[test]
fn second_completion_is_rejected_and_court_unchanged() {
    let (mut s, match_id) = session_with_active_match();
    complete_match(&mut s, match_id, 50).unwrap();
    let court_before = s.court(1).unwrap().clone();

    let err = complete_match(&mut s, match_id, 60).unwrap_err();

    assert!(matches!(err, EngineError::InvalidState(_)));
    assert_eq!(s.court(1).unwrap(), &court_before);
    assert_eq!(s.get_match(match_id).unwrap().ended_at, Some(50));
    assert_eq!(s.total_matches_completed, 1);
}

#[test]
fn unknown_match_is_not_found() {
    let mut s = doubles_session(1);
    assert_eq!(
        complete_match(&mut s, 99, 1).unwrap_err(),
        EngineError::MatchNotFound { match_id: 99 }
    );
}

// ----------------------
// cancel
// ----------------------

#[test]
fn cancel_returns_players_to_front_in_original_order() {
    let (mut s, match_id) = session_with_active_match();
    join(&mut s, "f", 20);

    cancel_match(&mut s, match_id).unwrap();

    let order: Vec<_> = s
        .queue
        .waiting()
        .map(|i| i.participant_id.as_str())
        .collect();
    assert_eq!(order, vec!["a", "b", "c", "d", "e", "f"]);
    assert!(s
        .queue
        .items()
        .iter()
        .all(|i| i.status == QueueStatus::Waiting));

    assert_eq!(s.court(1).unwrap().status, CourtStatus::Idle);
    assert_eq!(s.get_match(match_id).unwrap().status, MatchStatus::Canceled);

    // Отменённый матч нельзя завершить.
    assert!(matches!(
        complete_match(&mut s, match_id, 70).unwrap_err(),
        EngineError::InvalidState(_)
    ));
}

#[test]
fn canceled_players_are_picked_again_first() {
    let (mut s, match_id) = session_with_active_match();
    cancel_match(&mut s, match_id).unwrap();

    let report = run_assignment_cycle(&mut s, 30);
    let m = s.get_match(report.created[0].1).unwrap();

    assert_eq!(m.players, ids(&["a", "b", "c", "d"]));
}

#[test]
fn canceled_match_does_not_count_as_cooldown_round() {
    let mut s = doubles_session(2);
    for (n, id) in ["x1", "x2", "x3", "x4"].iter().enumerate() {
        join(&mut s, id, n as Timestamp + 1);
    }
    let first = run_assignment_cycle(&mut s, 10).created[0].1;
    complete_match(&mut s, first, 20).unwrap();
    assert_eq!(s.participant("x1").unwrap().cooldown, 1);
    assert_eq!(s.assignment_rounds, 1);

    for (n, id) in ["f1", "f2", "f3", "f4"].iter().enumerate() {
        join(&mut s, id, n as Timestamp + 21);
    }
    let fresh = ids(&["f1", "f2", "f3", "f4"]);

    // Подготовленный и отменённый матч: раунда не было.
    let prepared =
        coach_override_assign(&mut s, 1, &fresh, "coach", MatchStart::Scheduled, 30).unwrap();
    assert_eq!(s.participant("x1").unwrap().cooldown, 1);
    cancel_match(&mut s, prepared).unwrap();
    assert_eq!(s.participant("x1").unwrap().cooldown, 1);
    assert_eq!(s.assignment_rounds, 1);

    // Стартовавший и отменённый матч: раунд откатывается.
    let started =
        coach_override_assign(&mut s, 1, &fresh, "coach", MatchStart::Immediately, 40).unwrap();
    assert_eq!(s.participant("x1").unwrap().cooldown, 0);
    assert_eq!(s.assignment_rounds, 2);

    cancel_match(&mut s, started).unwrap();
    assert_eq!(s.get_match(started).unwrap().round, None);
    for pid in ["x1", "x2", "x3", "x4"] {
        assert_eq!(s.participant(pid).unwrap().cooldown, 1);
    }
    for pid in &fresh {
        assert_eq!(s.participant(pid).unwrap().cooldown, 0);
    }
    assert_eq!(s.assignment_rounds, 1);

    // Старт подготовленного матча засчитывает раунд.
    let again =
        coach_override_assign(&mut s, 2, &fresh, "coach", MatchStart::Scheduled, 50).unwrap();
    start_match(&mut s, again, 51).unwrap();
    assert_eq!(s.assignment_rounds, 2);
    assert_eq!(s.participant("x1").unwrap().cooldown, 0);
}

// ----------------------
// create / coach override / scheduled
// ----------------------

#[test]
fn create_with_too_few_players_changes_nothing() {
    let mut s = doubles_session(1);
    for id in ["a", "b", "c"] {
        join(&mut s, id, 1);
    }
    let before = s.clone();

    let err = create_match(
        &mut s,
        1,
        &ids(&["a", "b", "c"]),
        MatchCreator::System,
        MatchStart::Immediately,
        5,
    )
    .unwrap_err();

    assert_eq!(
        err,
        EngineError::InsufficientPlayers {
            required: 4,
            available: 3
        }
    );
    assert_eq!(s, before);
}

#[test]
fn coach_override_on_busy_court_is_rejected() {
    let (mut s, _) = session_with_active_match();
    for id in ["x", "y", "z"] {
        join(&mut s, id, 20);
    }

    let err = coach_override_assign(
        &mut s,
        1,
        &ids(&["e", "x", "y", "z"]),
        "coach",
        MatchStart::Immediately,
        30,
    )
    .unwrap_err();

    assert_eq!(err, EngineError::CourtUnavailable { court_id: 1 });
    assert_eq!(s.queue.waiting_count(), 4);
}

#[test]
fn coach_override_requires_waiting_players() {
    let mut s = doubles_session(2);
    for id in ["a", "b", "c"] {
        join(&mut s, id, 1);
    }
    s.upsert_participant("d", "d".into(), 4, 30, 1).unwrap();

    let err = coach_override_assign(
        &mut s,
        1,
        &ids(&["a", "b", "c", "d"]),
        "coach",
        MatchStart::Immediately,
        5,
    )
    .unwrap_err();

    assert_eq!(
        err,
        EngineError::NotQueued {
            participant_id: "d".into()
        }
    );
    // Никто не застрял в assigned.
    assert_eq!(s.queue.waiting_count(), 3);
    assert_eq!(s.court(1).unwrap().status, CourtStatus::Idle);
}

#[test]
fn coach_override_skips_scoring() {
    let mut s = doubles_session(1);
    for (n, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        join(&mut s, id, n as Timestamp);
    }

    let match_id = coach_override_assign(
        &mut s,
        1,
        &ids(&["e", "a", "c", "b"]),
        "coach-7",
        MatchStart::Immediately,
        9,
    )
    .unwrap();

    let m = s.get_match(match_id).unwrap();
    assert_eq!(m.players, ids(&["e", "a", "c", "b"]));
    assert_eq!(m.created_by, MatchCreator::Coach("coach-7".into()));
    assert_eq!(m.status, MatchStatus::Active);
    assert_eq!(s.queue.waiting_count(), 1);
}

#[test]
fn scheduled_match_starts_later_and_can_be_canceled() {
    let mut s = doubles_session(2);
    for (n, id) in ["a", "b", "c", "d"].iter().enumerate() {
        join(&mut s, id, n as Timestamp);
    }

    let prepared = coach_override_assign(
        &mut s,
        2,
        &ids(&["a", "b", "c", "d"]),
        "coach",
        MatchStart::Scheduled,
        5,
    )
    .unwrap();

    let m = s.get_match(prepared).unwrap();
    assert_eq!(m.status, MatchStatus::Scheduled);
    assert_eq!(m.started_at, None);
    assert_eq!(s.queue.get("a").unwrap().status, QueueStatus::Assigned);
    assert_eq!(s.court(2).unwrap().status, CourtStatus::Playing);

    // Завершить можно только активный матч.
    assert!(complete_match(&mut s, prepared, 6).is_err());

    // Отмена scheduled: обратно в waiting.
    cancel_match(&mut s, prepared).unwrap();
    assert_eq!(s.queue.waiting_count(), 4);
    assert_eq!(s.court(2).unwrap().status, CourtStatus::Idle);

    // Новый prepared матч стартует отдельно.
    let again = coach_override_assign(
        &mut s,
        2,
        &ids(&["a", "b", "c", "d"]),
        "coach",
        MatchStart::Scheduled,
        7,
    )
    .unwrap();
    start_match(&mut s, again, 8).unwrap();

    let m = s.get_match(again).unwrap();
    assert_eq!(m.status, MatchStatus::Active);
    assert_eq!(m.started_at, Some(8));
    assert!(s.queue.is_empty());

    assert!(matches!(
        start_match(&mut s, again, 9).unwrap_err(),
        EngineError::InvalidState(_)
    ));
}

// ----------------------
// Корты
// ----------------------

#[test]
fn down_on_busy_court_applies_after_completion() {
    let (mut s, match_id) = session_with_active_match();

    let change = s.courts.set_status(1, CourtStatus::Down).unwrap();
    assert_eq!(change, CourtStatusChange::DownDeferred);
    assert_eq!(s.court(1).unwrap().status, CourtStatus::Playing);

    let done = complete_match(&mut s, match_id, 40).unwrap();
    assert_eq!(done.court_status, CourtStatus::Down);

    let court = s.court(1).unwrap();
    assert_eq!(court.status, CourtStatus::Down);
    assert_eq!(court.current_match_id, None);
    assert!(!court.pending_down);
    assert!(s.courts.list_idle().is_empty());
}

#[test]
fn upsert_is_blocked_while_queued() {
    let mut s = doubles_session(1);
    join(&mut s, "a", 1);

    let err = s
        .upsert_participant("a", "renamed".into(), 7, 30, 2)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    assert_eq!(s.participant("a").unwrap().level, 4);
}
