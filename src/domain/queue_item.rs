use serde::{Deserialize, Serialize};

use crate::domain::{ParticipantId, Priority, Timestamp};

/// Статус элемента очереди.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QueueStatus {
    /// Ждёт корт.
    Waiting,
    /// Выбран в матч, матч ещё не стартовал.
    Assigned,
    /// Матч стартовал (элемент вот-вот будет удалён из очереди).
    Playing,
    /// Закрыт.
    Done,
}

impl QueueStatus {
    /// Активный элемент: участник "занят" очередью.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            QueueStatus::Waiting | QueueStatus::Assigned | QueueStatus::Playing
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::Assigned => "assigned",
            QueueStatus::Playing => "playing",
            QueueStatus::Done => "done",
        }
    }
}

/// Элемент очереди.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueItem {
    pub participant_id: ParticipantId,
    pub status: QueueStatus,
    pub priority: Priority,
    pub enqueued_at: Timestamp,
}

impl QueueItem {
    pub fn waiting(participant_id: ParticipantId, priority: Priority, now_ts: Timestamp) -> Self {
        Self {
            participant_id,
            status: QueueStatus::Waiting,
            priority,
            enqueued_at: now_ts,
        }
    }
}
