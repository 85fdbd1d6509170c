// src/engine/courts.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{Court, CourtId, CourtStatus, MatchId};
use crate::engine::errors::EngineError;

/// Реестр кортов.
///
/// Корты заводятся заранее (при старте сессии), ядро их не создаёт.
/// BTreeMap даёт стабильный порядок обхода по CourtId.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourtRegistry {
    courts: BTreeMap<CourtId, Court>,
}

/// Что реально произошло при `set_status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CourtStatusChange {
    Applied(CourtStatus),
    /// Корт занят матчем: `Down` отложен до конца матча.
    DownDeferred,
    Unchanged,
}

impl CourtRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Поднять `count` кортов с id 1..=count и именами "Court N".
    pub fn provision(count: u32) -> Self {
        let mut registry = Self::new();
        for n in 1..=count as CourtId {
            registry.add_court(Court::new(n, format!("Court {n}")));
        }
        registry
    }

    /// Добавить корт. Если корт с таким id уже был - заменяем его.
    pub fn add_court(&mut self, court: Court) {
        self.courts.insert(court.id, court);
    }

    pub fn get(&self, court_id: CourtId) -> Option<&Court> {
        self.courts.get(&court_id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Court> {
        self.courts.values()
    }

    pub fn len(&self) -> usize {
        self.courts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courts.is_empty()
    }

    /// Свободные корты в порядке id.
    pub fn list_idle(&self) -> Vec<CourtId> {
        self.courts
            .values()
            .filter(|c| c.is_idle())
            .map(|c| c.id)
            .collect()
    }

    /// Административная смена статуса: только `Idle` или `Down`.
    ///
    /// `Playing` выставляет только жизненный цикл матча через `attach_match`.
    pub fn set_status(
        &mut self,
        court_id: CourtId,
        status: CourtStatus,
    ) -> Result<CourtStatusChange, EngineError> {
        let court = self.court_mut(court_id)?;

        let change = match (status, court.current_match_id) {
            (CourtStatus::Playing, _) => {
                return Err(EngineError::invalid_state(
                    "court status 'playing' is set only by match lifecycle",
                ));
            }
            (CourtStatus::Down, Some(_)) => {
                court.pending_down = true;
                CourtStatusChange::DownDeferred
            }
            (CourtStatus::Idle, Some(_)) => {
                // Отменяем отложенный down, матч продолжается.
                if court.pending_down {
                    court.pending_down = false;
                    CourtStatusChange::Applied(CourtStatus::Playing)
                } else {
                    CourtStatusChange::Unchanged
                }
            }
            (new_status, None) => {
                court.pending_down = false;
                if court.status == new_status {
                    CourtStatusChange::Unchanged
                } else {
                    court.status = new_status;
                    CourtStatusChange::Applied(new_status)
                }
            }
        };

        info!(court_id, ?change, "court status change requested");
        Ok(change)
    }

    /// Занять корт матчем (`Idle → Playing`).
    pub fn attach_match(&mut self, court_id: CourtId, match_id: MatchId) -> Result<(), EngineError> {
        let court = self.court_mut(court_id)?;

        if !court.is_idle() {
            return Err(EngineError::CourtUnavailable { court_id });
        }

        court.status = CourtStatus::Playing;
        court.current_match_id = Some(match_id);
        debug!(court_id, match_id, "court attached");
        Ok(())
    }

    /// Освободить корт. Если был отложенный down - корт уходит в `Down`.
    ///
    /// Возвращает новый статус корта.
    pub fn detach_match(&mut self, court_id: CourtId) -> Result<CourtStatus, EngineError> {
        let court = self.court_mut(court_id)?;

        if court.current_match_id.is_none() {
            return Err(EngineError::invalid_state(format!(
                "court {court_id} has no match attached"
            )));
        }

        court.current_match_id = None;
        court.status = if court.pending_down {
            CourtStatus::Down
        } else {
            CourtStatus::Idle
        };
        court.pending_down = false;

        debug!(court_id, status = court.status.as_str(), "court detached");
        Ok(court.status)
    }

    fn court_mut(&mut self, court_id: CourtId) -> Result<&mut Court, EngineError> {
        self.courts
            .get_mut(&court_id)
            .ok_or(EngineError::CourtNotFound { court_id })
    }
}
