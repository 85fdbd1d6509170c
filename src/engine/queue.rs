// src/engine/queue.rs

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ParticipantId, Priority, QueueItem, QueueStatus, Timestamp};
use crate::engine::errors::EngineError;

/// Общая очередь сессии.
///
/// - элементы всегда отсортированы по `priority` (меньше = раньше);
/// - у участника не больше одного активного элемента;
/// - приоритеты при enqueue выдаются монотонно.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionQueue {
    items: Vec<QueueItem>,
    next_priority: Priority,
}

impl SessionQueue {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_priority: 1,
        }
    }

    /// Все элементы в порядке приоритета.
    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, participant_id: &str) -> Option<&QueueItem> {
        self.items
            .iter()
            .find(|i| i.participant_id == participant_id && i.status.is_active())
    }

    pub fn has_active(&self, participant_id: &str) -> bool {
        self.get(participant_id).is_some()
    }

    /// Ждущие игроки в порядке очереди.
    pub fn waiting(&self) -> impl Iterator<Item = &QueueItem> {
        self.items
            .iter()
            .filter(|i| i.status == QueueStatus::Waiting)
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting().count()
    }

    /// Встать в конец очереди.
    pub fn enqueue(
        &mut self,
        participant_id: &str,
        now_ts: Timestamp,
    ) -> Result<Priority, EngineError> {
        if self.has_active(participant_id) {
            return Err(EngineError::AlreadyQueued {
                participant_id: participant_id.to_string(),
            });
        }

        let priority = self.take_next_priority();
        self.items
            .push(QueueItem::waiting(participant_id.to_string(), priority, now_ts));
        self.sort();

        debug!(participant_id, priority, "queue: enqueued");
        Ok(priority)
    }

    /// Вернуться в очередь после матча.
    ///
    /// Получает новый приоритет в хвосте. Кулдаун считается отдельно
    /// (счётчик у участника), здесь только порядок.
    pub fn requeue_after_match(
        &mut self,
        participant_id: &str,
        now_ts: Timestamp,
    ) -> Result<Priority, EngineError> {
        self.enqueue(participant_id, now_ts)
    }

    /// Покинуть очередь. Можно только из `Waiting`.
    pub fn leave(&mut self, participant_id: &str) -> Result<QueueItem, EngineError> {
        let idx = self
            .items
            .iter()
            .position(|i| i.participant_id == participant_id && i.status == QueueStatus::Waiting)
            .ok_or_else(|| EngineError::NotQueued {
                participant_id: participant_id.to_string(),
            })?;

        let item = self.items.remove(idx);
        debug!(participant_id, "queue: left");
        Ok(item)
    }

    /// `Waiting → Assigned` для всех указанных игроков.
    ///
    /// Либо все, либо никто: если хоть один не в `Waiting` - ошибка без изменений.
    pub fn mark_assigned(&mut self, participant_ids: &[ParticipantId]) -> Result<(), EngineError> {
        self.transition(participant_ids, QueueStatus::Waiting, QueueStatus::Assigned)
    }

    /// `Assigned → Playing`.
    pub fn mark_playing(&mut self, participant_ids: &[ParticipantId]) -> Result<(), EngineError> {
        self.transition(participant_ids, QueueStatus::Assigned, QueueStatus::Playing)
    }

    /// Полностью убрать элементы (матч стартовал).
    ///
    /// Возвращает удалённые элементы.
    pub fn remove(&mut self, participant_ids: &[ParticipantId]) -> Vec<QueueItem> {
        let mut removed = Vec::new();
        self.items.retain(|i| {
            if participant_ids.contains(&i.participant_id) {
                removed.push(i.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Вернуть игроков в начало очереди, сохранив их взаимный порядок.
    ///
    /// Используется при отмене матча: игроков не штрафуем.
    pub fn reinsert_front(&mut self, mut items: Vec<QueueItem>) -> Result<(), EngineError> {
        if let Some(dup) = items.iter().find(|i| self.has_active(&i.participant_id)) {
            return Err(EngineError::AlreadyQueued {
                participant_id: dup.participant_id.clone(),
            });
        }

        items.sort_by_key(|i| i.priority);

        let front = self
            .items
            .first()
            .map(|i| i.priority)
            .unwrap_or(self.next_priority)
            .min(self.next_priority);
        let base = front - items.len() as Priority;

        for (offset, mut item) in items.into_iter().enumerate() {
            item.priority = base + offset as Priority;
            item.status = QueueStatus::Waiting;
            self.items.push(item);
        }

        self.sort();
        Ok(())
    }

    fn transition(
        &mut self,
        participant_ids: &[ParticipantId],
        from: QueueStatus,
        to: QueueStatus,
    ) -> Result<(), EngineError> {
        // 1. Проверяем всех, ничего не трогая.
        for (idx, pid) in participant_ids.iter().enumerate() {
            if participant_ids[..idx].contains(pid) {
                return Err(EngineError::invalid_state(format!(
                    "participant {pid} listed twice"
                )));
            }

            match self.get(pid) {
                None => {
                    return Err(EngineError::NotQueued {
                        participant_id: pid.clone(),
                    })
                }
                Some(item) if item.status != from => {
                    return Err(EngineError::invalid_state(format!(
                        "participant {pid} is {}, expected {}",
                        item.status.as_str(),
                        from.as_str()
                    )));
                }
                Some(_) => {}
            }
        }

        // 2. Применяем.
        for item in self
            .items
            .iter_mut()
            .filter(|i| participant_ids.contains(&i.participant_id) && i.status == from)
        {
            item.status = to;
        }

        Ok(())
    }

    fn take_next_priority(&mut self) -> Priority {
        let p = self.next_priority;
        self.next_priority += 1;
        p
    }

    fn sort(&mut self) {
        self.items.sort_by_key(|i| i.priority);
    }
}

impl Default for SessionQueue {
    fn default() -> Self {
        Self::new()
    }
}
