//! Shanten, tile acceptance and hand partitioning for riichi mahjong hands,
//! with an orchestrator that keeps results current while the hand changes.
mod macros;

pub mod algo;
pub mod calc;
pub mod hand;
pub mod tile;
pub mod wall;

pub use calc::{CalcConfig, CalculationResult, Orchestrator, Status};
pub use tile::Tile;
pub use wall::Wall;
