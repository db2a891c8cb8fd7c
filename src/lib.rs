//! Fireline battle engine library.
//!
//! Exposes the game-state arena, the invertible change log, dice
//! calculation, battle resolution and odds simulation for use by
//! integration tests and the binary entry point.

pub mod battle;
pub mod board;
pub mod change;
pub mod dice;
pub mod display;
pub mod history;
pub mod odds;
pub mod scenario;
