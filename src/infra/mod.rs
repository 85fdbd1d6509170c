//! Инфраструктурный слой вокруг движка сессии:
//! - генерация ID;
//! - часы (системные и ручные для тестов);
//! - RNG-реализации (нагрузочные сценарии);
//! - версионированное хранилище снапшотов (off-chain / тесты).

pub mod clock;
pub mod ids;
pub mod persistence;
#[cfg(not(target_arch = "wasm32"))]
pub mod rng;

pub use clock::*;
pub use ids::*;
pub use persistence::*;
#[cfg(not(target_arch = "wasm32"))]
pub use rng::*;
