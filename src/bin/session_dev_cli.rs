// src/bin/session_dev_cli.rs

use std::collections::BTreeMap;

use badminton_engine::api::{
    apply_admin, build_court_view, build_queue_view, build_session_view, AdminCommand, ApiError,
    CommandResponse, Intent, IntentKind, IntentProcessor, RegisterPayload, SubmitPaymentPayload,
};
use badminton_engine::domain::{
    EWallet, GameType, MatchId, ParticipantId, PaymentConfig, QueueMode, SessionConfig,
    SessionStatus,
};
use badminton_engine::engine::{run_assignment_cycle, SessionEngine};
use badminton_engine::infra::{IdGenerator, ManualClock};

/// Игроки сценария: ник, уровень, возраст.
const ROSTER: &[(&str, u8, u32)] = &[
    ("Ana", 5, 20),
    ("Ben", 5, 22),
    ("Caloy", 1, 20),
    ("Dina", 5, 21),
    ("Eli", 3, 35),
    ("Faye", 4, 28),
    ("Gio", 6, 19),
    ("Hana", 2, 44),
    ("Ivo", 4, 31),
];

struct Dev {
    session: SessionEngine,
    processor: IntentProcessor,
    payment: PaymentConfig,
    ids: IdGenerator,
    clock: ManualClock,
}

impl Dev {
    /// Отправить интент и вывести квитанцию.
    fn submit(&mut self, who: &str, kind: IntentKind) -> Option<CommandResponse> {
        let now_ts = self.clock.advance(5);
        let intent = Intent::new(self.ids.next_intent_id(), who, kind, now_ts);
        let receipt = self
            .processor
            .process(&mut self.session, &intent, &self.payment);

        if receipt.is_applied() {
            receipt.response
        } else {
            println!(
                "  [REJECTED] {} {}: {}",
                who,
                intent.kind.type_name(),
                receipt.reason.unwrap_or_default()
            );
            None
        }
    }

    fn admin(&mut self, cmd: AdminCommand) -> Result<CommandResponse, ApiError> {
        let now_ts = self.clock.advance(5);
        apply_admin(&mut self.session, &cmd, now_ts)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("session_dev_cli: стартуем dev-сценарий open-play сессии…");

    if let Err(e) = run() {
        eprintln!("session_dev_cli: ошибка: {} ({})", e.reason(), e.code());
        std::process::exit(1);
    }
}

fn run() -> Result<(), ApiError> {
    // 1. Конфиг: парные игры, платный вход, 2 корта.
    let config = SessionConfig {
        name: "Friday Open Play".to_string(),
        status: SessionStatus::Open,
        queue_mode: QueueMode::Auto,
        game_type: GameType::Doubles,
        score_to: 21,
        entry_fee_cents: 15_000,
        currency: "PHP".to_string(),
        cooldown_games: 1,
        max_consecutive: 2,
        court_count: 2,
        balance: Default::default(),
    };

    let mut e_wallets = BTreeMap::new();
    e_wallets.insert(
        "gcash".to_string(),
        EWallet {
            account_number: "0917-000-0000".to_string(),
            qr_url: None,
        },
    );
    let payment = PaymentConfig {
        amount_cents: 15_000,
        currency: "PHP".to_string(),
        e_wallets,
    };

    let mut dev = Dev {
        session: SessionEngine::new(config)?,
        processor: IntentProcessor::new(),
        payment,
        ids: IdGenerator::new("dev"),
        clock: ManualClock::new(1_700_000_000),
    };

    // 2. Регистрация → правила → оплата → подтверждение QM → очередь.
    println!();
    println!("================ CHECK-IN =================");

    let mut players: Vec<ParticipantId> = Vec::new();
    for (idx, (nickname, level, age)) in ROSTER.iter().enumerate() {
        let pid = dev.ids.next_participant_id();

        dev.submit(
            &pid,
            IntentKind::Register(RegisterPayload {
                nickname: nickname.to_string(),
                level: *level,
                age: *age,
            }),
        );
        dev.submit(&pid, IntentKind::AgreeToTerms);
        dev.submit(
            &pid,
            IntentKind::SubmitPayment(SubmitPaymentPayload {
                amount_cents: 15_000,
                currency: "PHP".to_string(),
                method: "gcash".to_string(),
                payment_ref: format!("GC{:04}", idx + 1),
            }),
        );
        dev.submit(
            "qm",
            IntentKind::ConfirmPayment {
                target_participant_id: pid.clone(),
            },
        );
        dev.submit(&pid, IntentKind::Enqueue);

        players.push(pid);
    }

    // Повторная постановка в очередь - ожидаемый отказ.
    dev.submit(&players[0], IntentKind::Enqueue);

    print_queue(&dev);

    // 3. Назначение.
    println!();
    println!("================ ASSIGNMENT #1 =================");
    let now_ts = dev.clock.advance(5);
    let report = run_assignment_cycle(&mut dev.session, now_ts);
    println!(
        "  создано матчей: {}, свободных кортов: {}, ждут: {}",
        report.created.len(),
        report.idle_courts_left,
        report.waiting_left
    );
    print_courts(&dev);

    // 4. Первый матч закончился, игроки возвращаются в очередь.
    let Some(&(_, first_match)) = report.created.first() else {
        println!("  матчей нет, сценарий окончен");
        return Ok(());
    };
    finish_and_requeue(&mut dev, first_match)?;

    println!();
    println!("================ ASSIGNMENT #2 (cooldown) =================");
    let now_ts = dev.clock.advance(5);
    let report = run_assignment_cycle(&mut dev.session, now_ts);
    println!(
        "  создано матчей: {}, cooldown снят: {}",
        report.created.len(),
        report.cooldown_waived
    );
    print_courts(&dev);
    print_queue(&dev);

    // 5. Корт 2 в down после матча, отмена матча возвращает игроков в начало очереди.
    println!();
    println!("================ ADMIN =================");
    if let CommandResponse::CourtState(court) = dev.admin(AdminCommand::SetCourtStatus {
        court_id: 2,
        status: badminton_engine::domain::CourtStatus::Down,
    })? {
        println!("  court {} -> pending_down={}", court.court_id, court.pending_down);
    }

    if let Some(&(_, match_id)) = report.created.first() {
        dev.admin(AdminCommand::CancelMatch { match_id })?;
        println!("  матч {match_id} отменён");
    }
    print_courts(&dev);
    print_queue(&dev);

    // 6. Итог.
    let view = build_session_view(&dev.session);
    println!();
    println!("================ SESSION =================");
    println!(
        "  {} [{}] участников={} ждут={} раундов={} завершено матчей={}",
        view.name,
        view.status,
        view.participants,
        view.waiting,
        view.assignment_rounds,
        view.total_matches_completed
    );

    Ok(())
}

fn finish_and_requeue(dev: &mut Dev, match_id: MatchId) -> Result<(), ApiError> {
    let players = dev.session.get_match(match_id)?.players.clone();

    println!();
    println!("================ MATCH {match_id} DONE =================");
    dev.submit("coach-1", IntentKind::CompleteMatch { match_id });
    for pid in &players {
        dev.submit(pid, IntentKind::RequeueAfterMatch);
    }
    print_queue(dev);
    Ok(())
}

fn print_queue(dev: &Dev) {
    println!("  --- очередь ---");
    for entry in build_queue_view(&dev.session) {
        println!(
            "  #{:<2} {:<8} lvl={} status={:<8} cooldown={}",
            entry.position, entry.nickname, entry.level, entry.status, entry.cooldown
        );
    }
}

fn print_courts(dev: &Dev) {
    println!("  --- корты ---");
    for court in dev.session.courts.all() {
        let view = build_court_view(court);
        let players = view
            .current_match_id
            .and_then(|id| dev.session.matches.get(&id))
            .map(|m| {
                m.players
                    .iter()
                    .filter_map(|pid| dev.session.participants.get(pid))
                    .map(|p| format!("{}({})", p.nickname, p.level))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!(
            "  {:<8} status={:<8} match={:?} [{}]",
            view.name, view.status, view.current_match_id, players
        );
    }
}
