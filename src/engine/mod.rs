//! Ядро open-play сессии: очередь, корты, матчи, балансировка.
//!
//! Высокоуровневый объект: `SessionEngine`
//! Основные операции:
//!   - `run_assignment_cycle` – раскидать ожидающих игроков по свободным кортам
//!   - `create_match` / `start_match` / `complete_match` / `cancel_match` – жизненный цикл матча
//!   - `coach_override_assign` – ручное назначение тренером

pub mod assignment;
pub mod courts;
pub mod errors;
pub mod lifecycle;
pub mod queue;
pub mod scoring;
pub mod selector;
pub mod session;

pub use assignment::{
    coach_override_assign, eligible_pool, pick_next_group, run_assignment_cycle, AssignmentReport,
    EligiblePool,
};
pub use courts::{CourtRegistry, CourtStatusChange};
pub use errors::EngineError;
pub use lifecycle::{cancel_match, complete_match, create_match, start_match, CompletedMatch, MatchStart};
pub use queue::SessionQueue;
pub use scoring::{score_candidates, ScoredCandidate};
pub use selector::{group_spread, select_group};
pub use session::SessionEngine;
