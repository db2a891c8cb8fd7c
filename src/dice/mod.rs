//! Dice calculation.
//!
//! Turns unit strengths into hits. Two strategies share one entry point:
//! direct rolling draws one die per roll, low luck resolves the integer part
//! of the total power deterministically and draws a single die for the
//! remainder.

pub mod calculator;
pub mod power;
pub mod random;
pub mod roll;

pub use calculator::{aa_annotation, roll_annotation, roll_dice, roll_n_dice, RollContext, RollStrategy};
pub use power::{aa_powers, unit_powers, CombatValue, TotalPowerAndRolls, UnitPower};
pub use random::{DiceCategory, RandomSource, RecordingRandom, ScriptedRandom, SeededRandom};
pub use roll::{DiceRoll, Die, DieKind};

/// Errors raised by dice calculation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    #[error("no firing units supplied for a roll")]
    NoFiringUnits,

    #[error("dice must have at least one side")]
    ZeroSides,

    #[error("random source returned {got} values, expected {expected}")]
    WrongCount { expected: u32, got: usize },

    #[error("random source returned {value}, outside [0, {sides})")]
    OutOfRange { value: u32, sides: u32 },
}
