use serde::{Deserialize, Serialize};

use crate::advisory::{suggest_or_empty, AdvisoryPlayer, AdvisoryRequest, MatchAdvisor};
use crate::domain::{
    Court, CourtId, Match, MatchId, Participant, ParticipantId, QueueMode, SessionStatus,
};
use crate::engine::SessionEngine;

use super::dto::{
    CourtViewDto, MatchViewDto, ParticipantDto, QueueEntryDto, SessionViewDto, SuggestionDto,
};
use super::errors::ApiError;

/// Запросы "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Query {
    /// Обзор сессии.
    GetSession,

    /// Очередь в порядке приоритета.
    GetQueue,

    /// Все корты.
    ListCourts,

    GetCourt { court_id: CourtId },

    GetMatch { match_id: MatchId },

    GetParticipant { participant_id: ParticipantId },

    /// Подсказки составов для участника (советник, только чтение).
    SuggestMatches { participant_id: ParticipantId },
}

/// Результат запроса "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum QueryResponse {
    Session(SessionViewDto),
    Queue(Vec<QueueEntryDto>),
    Courts(Vec<CourtViewDto>),
    Court(CourtViewDto),
    Match(MatchViewDto),
    Participant(ParticipantDto),
    Suggestions(Vec<SuggestionDto>),
}

/// Ответить на запрос по состоянию сессии.
pub fn answer_query(
    session: &SessionEngine,
    query: &Query,
    advisor: &dyn MatchAdvisor,
) -> Result<QueryResponse, ApiError> {
    let resp = match query {
        Query::GetSession => QueryResponse::Session(build_session_view(session)),
        Query::GetQueue => QueryResponse::Queue(build_queue_view(session)),
        Query::ListCourts => QueryResponse::Courts(
            session.courts.all().map(build_court_view).collect(),
        ),
        Query::GetCourt { court_id } => {
            QueryResponse::Court(build_court_view(session.court(*court_id)?))
        }
        Query::GetMatch { match_id } => {
            QueryResponse::Match(build_match_view(session.get_match(*match_id)?))
        }
        Query::GetParticipant { participant_id } => QueryResponse::Participant(
            build_participant_view(session, session.participant(participant_id)?),
        ),
        Query::SuggestMatches { participant_id } => {
            let requester = session.participant(participant_id)?;
            let request = build_advisory_request(session, requester);
            let suggestions = suggest_or_empty(advisor, &request)
                .into_iter()
                .map(|s| SuggestionDto {
                    players: s.players,
                    spread: s.spread,
                    rationale: s.rationale,
                })
                .collect();
            QueryResponse::Suggestions(suggestions)
        }
    };
    Ok(resp)
}

/// Сформировать DTO обзора сессии.
pub fn build_session_view(session: &SessionEngine) -> SessionViewDto {
    let cfg = &session.config;
    SessionViewDto {
        name: cfg.name.clone(),
        status: match cfg.status {
            SessionStatus::Open => "open",
            SessionStatus::Closed => "closed",
            SessionStatus::Archived => "archived",
        }
        .to_string(),
        queue_mode: match cfg.queue_mode {
            QueueMode::Auto => "auto",
            QueueMode::Manual => "manual",
        }
        .to_string(),
        game_type: cfg.game_type.as_str().to_string(),
        players_per_match: session.players_per_match() as u32,
        participants: session.participants.len() as u32,
        waiting: session.queue.waiting_count() as u32,
        idle_courts: session.courts.list_idle().len() as u32,
        active_matches: session.open_matches().count() as u32,
        assignment_rounds: session.assignment_rounds,
        total_matches_completed: session.total_matches_completed,
    }
}

/// Очередь по приоритету (меньше = раньше).
pub fn build_queue_view(session: &SessionEngine) -> Vec<QueueEntryDto> {
    let mut items: Vec<_> = session.queue.items().iter().collect();
    items.sort_by_key(|item| item.priority);

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let participant = session.participants.get(&item.participant_id);
            QueueEntryDto {
                position: idx as u32 + 1,
                participant_id: item.participant_id.clone(),
                nickname: participant.map(|p| p.nickname.clone()).unwrap_or_default(),
                level: participant.map(|p| p.level).unwrap_or_default(),
                status: item.status.as_str().to_string(),
                priority: item.priority,
                enqueued_at: item.enqueued_at,
                cooldown: participant.map(|p| p.cooldown).unwrap_or_default(),
            }
        })
        .collect()
}

pub fn build_court_view(court: &Court) -> CourtViewDto {
    CourtViewDto {
        court_id: court.id,
        name: court.name.clone(),
        status: court.status.as_str().to_string(),
        current_match_id: court.current_match_id,
        pending_down: court.pending_down,
    }
}

pub fn build_match_view(m: &Match) -> MatchViewDto {
    MatchViewDto {
        match_id: m.id,
        court_id: m.court_id,
        players: m.players.clone(),
        status: m.status.as_str().to_string(),
        created_by: m.created_by.label(),
        game_type: m.policy.game_type.as_str().to_string(),
        score_to: m.policy.score_to,
        created_at: m.created_at,
        started_at: m.started_at,
        ended_at: m.ended_at,
    }
}

pub fn build_participant_view(session: &SessionEngine, p: &Participant) -> ParticipantDto {
    ParticipantDto {
        participant_id: p.id.clone(),
        nickname: p.nickname.clone(),
        level: p.level,
        age: p.age,
        agreed_to_terms: p.agreed_to_terms,
        payment_submitted: p.payment_submitted,
        paid: p.paid,
        cooldown: p.cooldown,
        games_played: p.games_played,
        last_match_ended_at: p.last_match_ended_at,
        queue_status: session
            .queue
            .get(&p.id)
            .map(|item| item.status.as_str().to_string()),
        current_match_id: session.open_match_for(&p.id).map(|m| m.id),
    }
}

/// Запрос к советнику: уровень запросившего + все, кто ждёт (кроме него).
fn build_advisory_request(session: &SessionEngine, requester: &Participant) -> AdvisoryRequest {
    let available = session
        .queue
        .waiting()
        .filter(|item| item.participant_id != requester.id)
        .filter_map(|item| session.participants.get(&item.participant_id))
        .map(|p| AdvisoryPlayer {
            participant_id: p.id.clone(),
            level: p.level,
            age: p.age,
        })
        .collect();

    AdvisoryRequest {
        requester_id: requester.id.clone(),
        requester_level: requester.level,
        available,
        game_type: session.config.game_type,
    }
}
