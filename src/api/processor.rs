// src/api/processor.rs
//! Процессор интентов - единая точка входа для всех изменений от клиентов.
//!
//! Гарантии:
//!   - идемпотентность: квитанция хранится по `intent_id`, повтор ничего не меняет;
//!   - всё-или-ничего: интент применяется к черновой копии сессии,
//!     и копия заменяет оригинал только при успехе;
//!   - валидация payload на границе (уровень, возраст, ник, оплата).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{
    is_valid_level, CourtStatus, IntentId, ParticipantId, PaymentConfig, Timestamp,
    MAX_SKILL_LEVEL, MIN_SKILL_LEVEL,
};
use crate::engine::{
    cancel_match, coach_override_assign, complete_match, run_assignment_cycle, start_match,
    CourtStatusChange, EngineError, MatchStart, SessionEngine,
};

use super::commands::{
    AdminCommand, CoachOverridePayload, Intent, IntentKind, IntentStatus, RegisterPayload,
    SubmitPaymentPayload,
};
use super::dto::{CommandResponse, IntentReceipt};
use super::errors::ApiError;
use super::queries::{build_court_view, build_match_view, build_participant_view, build_queue_view};

pub const MAX_NICKNAME_LEN: usize = 40;
pub const MAX_AGE: u32 = 120;
pub const PAYMENT_REF_MIN_LEN: usize = 4;
pub const PAYMENT_REF_MAX_LEN: usize = 32;

/// Процессор интентов с журналом квитанций.
///
/// Журнал - часть состояния сессии (лежит в снапшоте рядом с движком),
/// поэтому идемпотентность переживает перезапуск.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntentProcessor {
    receipts: BTreeMap<IntentId, IntentReceipt>,
}

impl IntentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receipt(&self, intent_id: &str) -> Option<&IntentReceipt> {
        self.receipts.get(intent_id)
    }

    pub fn receipts_len(&self) -> usize {
        self.receipts.len()
    }

    /// Обработать интент.
    ///
    /// Всегда возвращает квитанцию. Отказ по конфликту или таймауту
    /// в журнал не пишется: тот же интент можно прислать ещё раз.
    pub fn process(
        &mut self,
        session: &mut SessionEngine,
        intent: &Intent,
        payment: &PaymentConfig,
    ) -> IntentReceipt {
        if let Some(existing) = self.receipts.get(&intent.id) {
            debug!(intent_id = intent.id.as_str(), "intent already processed, replaying receipt");
            return existing.clone();
        }

        let mut draft = session.clone();
        let receipt = match apply_intent(&mut draft, intent, payment) {
            Ok(response) => {
                *session = draft;
                info!(
                    intent_id = intent.id.as_str(),
                    participant_id = intent.participant_id.as_str(),
                    kind = intent.kind.type_name(),
                    elevated = intent.kind.requires_elevated(),
                    "intent applied"
                );
                IntentReceipt::applied(intent.id.clone(), response)
            }
            Err(err) => {
                warn!(
                    intent_id = intent.id.as_str(),
                    participant_id = intent.participant_id.as_str(),
                    kind = intent.kind.type_name(),
                    code = err.code(),
                    reason = %err.reason(),
                    "intent rejected"
                );
                let receipt = IntentReceipt::rejected(intent.id.clone(), err.code(), err.reason());
                if err.is_retryable() {
                    // Не запоминаем: тот же интент придёт ещё раз.
                    return receipt;
                }
                receipt
            }
        };

        self.receipts.insert(intent.id.clone(), receipt.clone());
        receipt
    }
}

/// Применить интент к сессии (без журнала).
///
/// При ошибке сессия может быть изменена частично, поэтому снаружи
/// вызывается только на черновике (см. `IntentProcessor::process`).
pub fn apply_intent(
    session: &mut SessionEngine,
    intent: &Intent,
    payment: &PaymentConfig,
) -> Result<CommandResponse, ApiError> {
    if intent.status != IntentStatus::New {
        return Err(ApiError::BadRequest(format!(
            "intent {} already has status {:?}",
            intent.id, intent.status
        )));
    }
    if intent.id.trim().is_empty() {
        return Err(ApiError::BadRequest("intent id is empty".into()));
    }

    session.ensure_open()?;

    let who = intent.participant_id.as_str();
    let now_ts = intent.created_at;

    match &intent.kind {
        IntentKind::Register(payload) => register(session, who, payload, now_ts),

        IntentKind::AgreeToTerms => {
            session.participant_mut(who)?.agreed_to_terms = true;
            participant_response(session, who)
        }

        IntentKind::SubmitPayment(payload) => submit_payment(session, who, payload, payment),

        IntentKind::ConfirmPayment {
            target_participant_id,
        } => confirm_payment(session, target_participant_id),

        IntentKind::Enqueue => {
            ensure_can_queue(session, who)?;
            session.queue.enqueue(who, now_ts)?;
            queued_response(session, who)
        }

        IntentKind::LeaveQueue => {
            session.queue.leave(who)?;
            Ok(CommandResponse::Ok)
        }

        IntentKind::RequeueAfterMatch => {
            let p = session.participant(who)?;
            if p.last_match_ended_at.is_none() {
                return Err(EngineError::invalid_state(format!(
                    "participant {who} has not finished a match yet"
                ))
                .into());
            }
            ensure_can_queue(session, who)?;
            session.queue.requeue_after_match(who, now_ts)?;
            queued_response(session, who)
        }

        IntentKind::CoachOverrideAssign(CoachOverridePayload {
            court_id,
            player_ids,
        }) => {
            validate_player_list(player_ids)?;
            let match_id = coach_override_assign(
                session,
                *court_id,
                player_ids,
                who,
                MatchStart::Immediately,
                now_ts,
            )?;
            Ok(CommandResponse::MatchCreated(build_match_view(
                session.get_match(match_id)?,
            )))
        }

        IntentKind::CompleteMatch { match_id } => {
            let done = complete_match(session, *match_id, now_ts)?;
            Ok(CommandResponse::MatchCompleted {
                r#match: build_match_view(session.get_match(done.match_id)?),
                court: build_court_view(session.court(done.court_id)?),
            })
        }
    }
}

/// Выполнить административную команду.
///
/// Без журнала квитанций: команды админки не идемпотентны по id,
/// но каждая атомарна (черновик + замена).
pub fn apply_admin(
    session: &mut SessionEngine,
    cmd: &AdminCommand,
    now_ts: Timestamp,
) -> Result<CommandResponse, ApiError> {
    let mut draft = session.clone();
    let response = apply_admin_inner(&mut draft, cmd, now_ts)?;
    *session = draft;
    Ok(response)
}

fn apply_admin_inner(
    session: &mut SessionEngine,
    cmd: &AdminCommand,
    now_ts: Timestamp,
) -> Result<CommandResponse, ApiError> {
    match cmd {
        AdminCommand::SetCourtStatus { court_id, status } => {
            if *status == CourtStatus::Playing {
                return Err(ApiError::BadRequest(
                    "court status can be set only to idle or down".into(),
                ));
            }
            let change = session.courts.set_status(*court_id, *status)?;
            if change == CourtStatusChange::DownDeferred {
                info!(court_id, "court will go down after its match ends");
            }
            Ok(CommandResponse::CourtState(build_court_view(
                session.court(*court_id)?,
            )))
        }

        AdminCommand::PrepareMatch {
            coach_id,
            court_id,
            player_ids,
        } => {
            session.ensure_open()?;
            validate_player_list(player_ids)?;
            let match_id = coach_override_assign(
                session,
                *court_id,
                player_ids,
                coach_id,
                MatchStart::Scheduled,
                now_ts,
            )?;
            Ok(CommandResponse::MatchCreated(build_match_view(
                session.get_match(match_id)?,
            )))
        }

        AdminCommand::StartMatch { match_id } => {
            start_match(session, *match_id, now_ts)?;
            Ok(CommandResponse::MatchState(build_match_view(
                session.get_match(*match_id)?,
            )))
        }

        AdminCommand::CancelMatch { match_id } => {
            cancel_match(session, *match_id)?;
            Ok(CommandResponse::MatchState(build_match_view(
                session.get_match(*match_id)?,
            )))
        }

        AdminCommand::RunAssignment => {
            let report = run_assignment_cycle(session, now_ts);
            let mut created = Vec::with_capacity(report.created.len());
            for (_, match_id) in report.created {
                created.push(build_match_view(session.get_match(match_id)?));
            }
            Ok(CommandResponse::Assigned(created))
        }
    }
}

// ============================================================================
// Отдельные интенты
// ============================================================================

fn register(
    session: &mut SessionEngine,
    who: &str,
    payload: &RegisterPayload,
    now_ts: Timestamp,
) -> Result<CommandResponse, ApiError> {
    let nickname = payload.nickname.trim();
    if nickname.is_empty() {
        return Err(ApiError::BadRequest("nickname is empty".into()));
    }
    if nickname.chars().count() > MAX_NICKNAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "nickname longer than {MAX_NICKNAME_LEN} characters"
        )));
    }
    if !is_valid_level(payload.level) {
        return Err(ApiError::BadRequest(format!(
            "level {} out of range {MIN_SKILL_LEVEL}..={MAX_SKILL_LEVEL}",
            payload.level
        )));
    }
    if payload.age == 0 || payload.age > MAX_AGE {
        return Err(ApiError::BadRequest(format!(
            "age {} out of range 1..={MAX_AGE}",
            payload.age
        )));
    }
    if who.trim().is_empty() {
        return Err(ApiError::BadRequest("participant id is empty".into()));
    }

    let created = session.upsert_participant(
        who,
        nickname.to_string(),
        payload.level,
        payload.age,
        now_ts,
    )?;
    debug!(participant_id = who, created, "participant registered");

    participant_response(session, who)
}

fn submit_payment(
    session: &mut SessionEngine,
    who: &str,
    payload: &SubmitPaymentPayload,
    payment: &PaymentConfig,
) -> Result<CommandResponse, ApiError> {
    if !session.config.payment_required() {
        return Err(EngineError::invalid_state("session is free, no payment needed").into());
    }

    // Сумма и валюта: из внешнего PaymentConfig, а если он пустой - из сессии.
    let expected_amount = if payment.amount_cents > 0 {
        payment.amount_cents
    } else {
        session.config.entry_fee_cents
    };
    let expected_currency = if payment.currency.trim().is_empty() {
        session.config.currency.as_str()
    } else {
        payment.currency.as_str()
    };

    if payload.amount_cents != expected_amount {
        return Err(ApiError::BadRequest(format!(
            "payment amount {} does not match expected {expected_amount}",
            payload.amount_cents
        )));
    }
    if !payload.currency.eq_ignore_ascii_case(expected_currency) {
        return Err(ApiError::BadRequest(format!(
            "payment currency {} does not match expected {expected_currency}",
            payload.currency
        )));
    }
    if !payment.accepts_method(&payload.method) {
        return Err(ApiError::BadRequest(format!(
            "payment method '{}' is not accepted",
            payload.method
        )));
    }
    validate_payment_ref(&payload.payment_ref)?;

    let p = session.participant_mut(who)?;
    if p.paid {
        return Err(EngineError::invalid_state(format!("participant {who} already paid")).into());
    }
    p.payment_submitted = true;
    p.payment_ref = Some(payload.payment_ref.clone());
    p.payment_method = Some(payload.method.clone());

    participant_response(session, who)
}

fn confirm_payment(
    session: &mut SessionEngine,
    target: &str,
) -> Result<CommandResponse, ApiError> {
    let p = session.participant_mut(target)?;
    if p.paid {
        return Err(
            EngineError::invalid_state(format!("payment of {target} already confirmed")).into(),
        );
    }
    if !p.payment_submitted {
        return Err(
            EngineError::invalid_state(format!("participant {target} has not submitted payment"))
                .into(),
        );
    }
    p.paid = true;

    participant_response(session, target)
}

// ============================================================================
// Проверки
// ============================================================================

/// Можно ли участнику встать в очередь: правила, оплата, не в матче.
fn ensure_can_queue(session: &SessionEngine, who: &str) -> Result<(), ApiError> {
    let p = session.participant(who)?;

    if !p.agreed_to_terms {
        return Err(
            EngineError::invalid_state(format!("participant {who} has not agreed to terms")).into(),
        );
    }
    if !p.is_cleared_to_play(session.config.payment_required()) {
        return Err(
            EngineError::invalid_state(format!("payment of {who} is not confirmed")).into(),
        );
    }
    if let Some(m) = session.open_match_for(who) {
        return Err(EngineError::invalid_state(format!(
            "participant {who} is in match {}",
            m.id
        ))
        .into());
    }
    Ok(())
}

fn validate_player_list(player_ids: &[ParticipantId]) -> Result<(), ApiError> {
    if player_ids.is_empty() {
        return Err(ApiError::BadRequest("player list is empty".into()));
    }
    for (idx, pid) in player_ids.iter().enumerate() {
        if player_ids[..idx].contains(pid) {
            return Err(ApiError::BadRequest(format!("player {pid} listed twice")));
        }
    }
    Ok(())
}

fn validate_payment_ref(payment_ref: &str) -> Result<(), ApiError> {
    let len = payment_ref.chars().count();
    if !(PAYMENT_REF_MIN_LEN..=PAYMENT_REF_MAX_LEN).contains(&len)
        || !payment_ref.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ApiError::BadRequest(format!(
            "payment reference must be {PAYMENT_REF_MIN_LEN}-{PAYMENT_REF_MAX_LEN} alphanumeric characters"
        )));
    }
    Ok(())
}

fn participant_response(session: &SessionEngine, who: &str) -> Result<CommandResponse, ApiError> {
    let p = session.participant(who)?;
    Ok(CommandResponse::Participant(build_participant_view(
        session, p,
    )))
}

fn queued_response(session: &SessionEngine, who: &str) -> Result<CommandResponse, ApiError> {
    build_queue_view(session)
        .into_iter()
        .find(|entry| entry.participant_id == who)
        .map(CommandResponse::Queued)
        .ok_or_else(|| ApiError::Internal(format!("participant {who} missing from queue view")))
}
