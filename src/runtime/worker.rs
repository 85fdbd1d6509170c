use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::hub::SessionHub;

/// Фоновое назначение: просыпается по сигналу хаба (очередь / корты
/// изменились) и по таймеру, и прогоняет проход назначения.
pub struct AssignmentWorker {
    hub: Arc<SessionHub>,
    changes: watch::Receiver<u64>,
    shutdown: watch::Receiver<bool>,
    tick: Interval,
}

impl AssignmentWorker {
    pub fn new(hub: Arc<SessionHub>) -> Self {
        let mut tick = interval(Duration::from_millis(hub.config().worker_tick_ms));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            changes: hub.subscribe(),
            shutdown: hub.shutdown_signal(),
            hub,
            tick,
        }
    }

    /// Основной цикл. Выходит по `SessionHub::shutdown`.
    pub async fn run(&mut self) {
        info!("assignment worker started");

        loop {
            tokio::select! {
                changed = self.changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    debug!(version = *self.changes.borrow(), "assignment worker: change signal");
                }
                _ = self.tick.tick() => {}
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                }
            }

            if *self.shutdown.borrow() {
                break;
            }
            self.pass().await;
        }

        info!("assignment worker stopped");
    }

    /// Прогон до тишины: пока проход создаёт матчи, повторяем.
    async fn pass(&self) {
        loop {
            match self.hub.run_assignment_pass().await {
                Ok(report) if report.is_quiescent() => return,
                Ok(report) => {
                    debug!(
                        created = report.created.len(),
                        waiting_left = report.waiting_left,
                        "assignment worker: matches created"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "assignment worker: pass failed");
                    return;
                }
            }
        }
    }
}

/// Запустить воркер назначения фоновой задачей.
pub fn spawn_assignment_worker(hub: Arc<SessionHub>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut worker = AssignmentWorker::new(hub);
        worker.run().await;
    })
}
