//! Board representation and game-state types.
//!
//! Contains the arena-backed data model for players, unit types, combat
//! units and battle sites.

pub mod player;
pub mod site;
pub mod state;
pub mod unit;

pub use player::{Player, PlayerId};
pub use site::{BattleSite, SiteId};
pub use state::{BoardError, GameState};
pub use unit::{CombatUnit, UnitId, UnitType, UnitTypeId};
