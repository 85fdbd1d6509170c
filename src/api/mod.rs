//! Внешний API движка сессии.
//!
//! Здесь описываются:
//! - интенты и админ-команды (commands.rs) - всё, что меняет состояние;
//! - запросы (queries.rs) - только чтение;
//! - DTO (dto.rs) - удобные структуры для фронта;
//! - ошибки (errors.rs) - то, что видит клиент;
//! - процессор интентов (processor.rs) - идемпотентная точка входа.

pub mod commands;
pub mod dto;
pub mod errors;
pub mod processor;
pub mod queries;

pub use commands::*;
pub use dto::*;
pub use errors::*;
pub use processor::*;
pub use queries::*;
