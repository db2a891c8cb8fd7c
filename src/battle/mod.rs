//! Battle resolution.
//!
//! A battle runs as a stack of [`BattleStep`]s. Each round visits the
//! phases in ascending order, each (phase, side) pair fires its abilities
//! in firing groups, and casualties are committed through the
//! [`BattleActions`] collaborator as logged changes.

pub mod ability;
pub mod actions;
pub mod bridge;
pub mod casualty;
pub mod fire;
pub mod firing;
pub mod phase;
pub mod rules;
pub mod side;
pub mod stack;
pub mod state;
pub mod step;

use thiserror::Error;
use tracing::debug;

use crate::board::{BoardError, GameState, SiteId, UnitId};
use crate::change::ChangeError;
use crate::dice::DiceError;

pub use ability::{generate, CombatValueType, ConvertUnitAbility, Targets, Team, UnitAbility};
pub use actions::{BattleActions, StandardActions};
pub use bridge::Bridge;
pub use casualty::{select_casualties, Casualties};
pub use firing::{group_by_suicide_on_hit, split, valid_targets, FiringGroup};
pub use phase::{BattlePhase, BattlePhaseList};
pub use rules::BattleRules;
pub use side::Side;
pub use stack::{ExecutionStack, StepHandler, StepRegistry};
pub use state::{Battle, BattleId, BattleState, Outcome, UnitFilter};
pub use step::{end_battle, round_steps, BattleStep, StepContext};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    #[error(transparent)]
    Change(#[from] ChangeError),
    #[error(transparent)]
    Dice(#[from] DiceError),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("unknown phase {0:?}")]
    UnknownPhase(String),
    #[error("phase {0:?} already exists")]
    DuplicatePhase(String),
    #[error("no handler registered for step {0:?}")]
    UnknownStep(String),
    #[error("a handler for step {0:?} is already registered")]
    DuplicateStep(String),
    #[error("unit {0} appears more than once in the battle")]
    DuplicateUnit(UnitId),
    #[error("site {0} is not a retreat option")]
    InvalidRetreat(SiteId),
    #[error("battle stack drained without an outcome")]
    NotFinished,
    #[error("thread pool: {0}")]
    ThreadPool(String),
}

/// The stack for the first round of `battle`.
pub fn start(battle: &Battle, game: &GameState) -> Result<ExecutionStack, BattleError> {
    let mut stack = ExecutionStack::new();
    stack.push_all(round_steps(battle, game)?);
    debug!(battle = %battle.id, steps = stack.len(), "battle started");
    Ok(stack)
}

/// Runs a pending stack to completion. Returns the outcome, or `None` if
/// the stack drained without one (possible when custom steps replace the
/// round structure).
pub fn resume(
    stack: &mut ExecutionStack,
    battle: &mut Battle,
    bridge: &mut Bridge<'_>,
    actions: &mut dyn BattleActions,
    registry: &StepRegistry,
) -> Result<Option<Outcome>, BattleError> {
    let mut ctx = StepContext {
        battle,
        bridge,
        actions,
        registry,
    };
    stack.execute(&mut ctx)?;
    Ok(ctx.battle.outcome)
}

/// Fights `battle` from its current round until it ends.
pub fn fight(
    battle: &mut Battle,
    bridge: &mut Bridge<'_>,
    actions: &mut dyn BattleActions,
    registry: &StepRegistry,
) -> Result<Outcome, BattleError> {
    if let Some(outcome) = battle.outcome {
        return Ok(outcome);
    }
    let mut stack = start(battle, bridge.state)?;
    resume(&mut stack, battle, bridge, actions, registry)?.ok_or(BattleError::NotFinished)
}
