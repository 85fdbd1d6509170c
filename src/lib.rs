//! Open-play сессия бадминтона на Linera: очередь, корты, матчи.
//!
//! Здесь описываем ABI (Operation / Message / Query / Response) и
//! связываем contract/service с нашим BadmintonState.

pub mod advisory;
pub mod api;
pub mod domain;
pub mod engine;
pub mod infra;
#[cfg(not(target_arch = "wasm32"))]
pub mod runtime;
pub mod state;

use linera_sdk::linera_base_types::{ContractAbi, ServiceAbi};
use serde::{Deserialize, Serialize};

use crate::api::{AdminCommand, Intent, Query, QueryResponse};
use crate::state::BadmintonState;

/// Операции (внешние команды), которые модуль принимает.
///
/// Интенты игроков и тренеров + админ-команды QM.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BadmintonOperation {
    Intent(Intent),
    Admin(AdminCommand),
}

/// Сообщения между приложениями Linera.
/// Пока нам не нужны – оставим пустой enum.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BadmintonMessage {}

/// Запросы к сервису (read-only).
pub type BadmintonQuery = Query;

/// Ответы на запросы.
pub type BadmintonResponse = QueryResponse;

/// ABI для контракта и сервиса.
#[derive(Clone, Debug)]
pub struct BadmintonAbi;

impl ContractAbi for BadmintonAbi {
    type Operation = BadmintonOperation;
    type Response = ();
}

impl ServiceAbi for BadmintonAbi {
    type Query = BadmintonQuery;
    type QueryResponse = BadmintonResponse;
}

/// Экспортируем типы состояния, чтобы contract.rs и service.rs могли их использовать.
pub type Storage = BadmintonState;
