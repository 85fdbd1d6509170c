//! Доменная модель open-play сессии: участники, очередь, корты, матчи, конфиг сессии.

pub mod court;
pub mod matches;
pub mod participant;
pub mod queue_item;
pub mod session;

// Базовые идентификаторы.
//
// ParticipantId приходит от клиента (стабильный client id, обычно UUID),
// поэтому это строка. Корты и матчи нумеруем сами.
pub type ParticipantId = String;
pub type CourtId = u64;
pub type MatchId = u64;
pub type IntentId = String;

/// Unix timestamp в секундах (UTC).
pub type Timestamp = u64;

/// Приоритет в очереди: меньше = раньше.
///
/// Знаковый, потому что отменённый матч возвращает игроков
/// в начало очереди (приоритеты ниже текущего минимума).
pub type Priority = i64;

// Удобные реэкспорты, чтобы в других модулях писать crate::domain::Court и т.п.
pub use court::*;
pub use matches::*;
pub use participant::*;
pub use queue_item::*;
pub use session::*;
