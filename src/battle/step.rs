//! Battle steps.
//!
//! A step is plain data so a pending stack can be persisted and restored.
//! Executing a step may push further steps; `NextRound` pushes the whole
//! next round, which is how combat loops until a side is gone.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::actions::BattleActions;
use super::bridge::Bridge;
use super::casualty::{clear_casualties, clear_first_strike_casualties, remove_suicide_units};
use super::fire::fire;
use super::firing::split;
use super::phase::{BattlePhaseList, FIRST_STRIKE, FIRST_STRIKE_ORDER};
use super::side::Side;
use super::stack::{ExecutionStack, StepRegistry};
use super::state::{Battle, BattleState, Outcome, UnitFilter};
use super::BattleError;
use crate::board::{GameState, UnitId};
use crate::change::Change;
use crate::history::{describe_units, HistoryPayload};

/// One executable unit of battle work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleStep {
    /// Evading units of a side may leave combat.
    Submerge(Side),
    /// A side fires its abilities for one phase.
    Fire { phase: String, side: Side },
    /// First-strike casualties that fired back are removed.
    ClearFirstStrikeCasualties,
    RemoveFirstStrikeSuicide,
    RemoveGeneralSuicide,
    ClearCasualties,
    CheckGeneralBattleEnd,
    OffensiveGeneralRetreat,
    NextRound,
    /// A handler looked up by name in the `StepRegistry`.
    Custom(String),
}

impl fmt::Display for BattleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleStep::Submerge(side) => write!(f, "{side} submerge"),
            BattleStep::Fire { phase, side } => write!(f, "{side} fire ({phase})"),
            BattleStep::ClearFirstStrikeCasualties => write!(f, "clear first strike casualties"),
            BattleStep::RemoveFirstStrikeSuicide => write!(f, "remove first strike suicide units"),
            BattleStep::RemoveGeneralSuicide => write!(f, "remove suicide units"),
            BattleStep::ClearCasualties => write!(f, "clear casualties"),
            BattleStep::CheckGeneralBattleEnd => write!(f, "check battle end"),
            BattleStep::OffensiveGeneralRetreat => write!(f, "attacker retreat"),
            BattleStep::NextRound => write!(f, "next round"),
            BattleStep::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// What a step executes against.
pub struct StepContext<'a, 'b> {
    pub battle: &'a mut Battle,
    pub bridge: &'a mut Bridge<'b>,
    pub actions: &'a mut dyn BattleActions,
    pub registry: &'a StepRegistry,
}

impl BattleStep {
    /// Runs the step. Steps left on the stack after the battle has ended do
    /// nothing.
    pub fn execute(
        &self,
        stack: &mut ExecutionStack,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<(), BattleError> {
        if ctx.battle.is_over() {
            return Ok(());
        }
        match self {
            BattleStep::Submerge(side) => submerge(ctx, *side),
            BattleStep::Fire { phase, side } => fire(ctx.battle, ctx.bridge, ctx.actions, phase, *side),
            BattleStep::ClearFirstStrikeCasualties => {
                clear_first_strike_casualties(ctx.battle, ctx.bridge, ctx.actions)
            }
            BattleStep::RemoveFirstStrikeSuicide => remove_suicide_units(ctx.battle, ctx.bridge, ctx.actions, true),
            BattleStep::RemoveGeneralSuicide => remove_suicide_units(ctx.battle, ctx.bridge, ctx.actions, false),
            BattleStep::ClearCasualties => clear_casualties(ctx.battle, ctx.bridge, ctx.actions),
            BattleStep::CheckGeneralBattleEnd => check_battle_end(ctx),
            BattleStep::OffensiveGeneralRetreat => offensive_retreat(ctx),
            BattleStep::NextRound => next_round(stack, ctx),
            BattleStep::Custom(name) => {
                let registry = ctx.registry;
                registry.run(name, stack, ctx)
            }
        }
    }
}

/// The steps of the battle's current round, in execution order.
///
/// Once the first-strike phase is over, its casualties that fired back are
/// cleared (when anything fired in it) and first-strike suicide units are
/// removed. General suicide units and the other waiting casualties go at the
/// end of the round, before the end check.
pub fn round_steps(battle: &Battle, game: &GameState) -> Result<Vec<BattleStep>, BattleError> {
    let view = battle.view(game);
    let resolved = battle.phases.resolved(&view)?;
    let mut steps = Vec::new();
    if battle.rules.submersible_units {
        for side in Side::BOTH {
            if !view.filter_by_type(UnitFilter::Alive, side, |t| t.can_evade)?.is_empty() {
                steps.push(BattleStep::Submerge(side));
            }
        }
    }
    let mut first_strike_cleared = false;
    let mut first_strike_fired = false;
    for phase in resolved.phases() {
        if !first_strike_cleared && phase.order > FIRST_STRIKE_ORDER {
            push_first_strike_cleanup(&mut steps, first_strike_fired);
            first_strike_cleared = true;
        }
        let phase_steps = phase.steps_for(&view)?;
        if phase.name == FIRST_STRIKE {
            first_strike_fired = phase_steps.iter().any(|s| matches!(s, BattleStep::Fire { .. }));
        }
        steps.extend(phase_steps);
    }
    if !first_strike_cleared {
        push_first_strike_cleanup(&mut steps, first_strike_fired);
    }
    steps.extend([
        BattleStep::RemoveGeneralSuicide,
        BattleStep::ClearCasualties,
        BattleStep::CheckGeneralBattleEnd,
        BattleStep::OffensiveGeneralRetreat,
        BattleStep::NextRound,
    ]);
    Ok(steps)
}

fn push_first_strike_cleanup(steps: &mut Vec<BattleStep>, first_strike_fired: bool) {
    if first_strike_fired {
        steps.push(BattleStep::ClearFirstStrikeCasualties);
    }
    steps.push(BattleStep::RemoveFirstStrikeSuicide);
}

fn submerge(ctx: &mut StepContext<'_, '_>, side: Side) -> Result<(), BattleError> {
    let (chosen, text) = {
        let view = ctx.battle.view(ctx.bridge.state);
        let enemy_destroyers = view.filter_by_type(UnitFilter::Alive, side.opposite(), |t| t.is_destroyer)?;
        if !enemy_destroyers.is_empty() {
            return Ok(());
        }
        let candidates = view.filter_by_type(UnitFilter::Alive, side, |t| t.can_evade)?;
        if candidates.is_empty() {
            return Ok(());
        }
        let chosen: Vec<UnitId> = ctx
            .actions
            .query_submerge(&view, side, &candidates)
            .into_iter()
            .filter(|u| candidates.contains(u))
            .collect();
        if chosen.is_empty() {
            return Ok(());
        }
        let text = format!(
            "{} submerge {}",
            view.player_name(side)?,
            describe_units(view.game, &chosen)?
        );
        (chosen, text)
    };
    ctx.bridge
        .history
        .record_event(&text, HistoryPayload::Units(chosen.clone()));
    ctx.actions
        .submerge_units(&chosen, side, ctx.bridge, ctx.battle.site)
}

/// True if any active ability of `side` has something to fire at.
fn can_fire(
    view: &BattleState<'_>,
    phases: &BattlePhaseList,
    side: Side,
    round: u32,
) -> Result<bool, BattleError> {
    for phase in phases.phases() {
        for ability in phase.abilities_for(view.player(side)) {
            if ability.is_active(side, round) && !split(view, ability, side)?.is_empty() {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn check_battle_end(ctx: &mut StepContext<'_, '_>) -> Result<(), BattleError> {
    let outcome = {
        let battle = &*ctx.battle;
        let view = battle.view(ctx.bridge.state);
        let offense = view.filter_by_type(UnitFilter::Alive, Side::Offense, |t| !t.is_infrastructure)?;
        let defense = view.filter_by_type(UnitFilter::Alive, Side::Defense, |t| !t.is_infrastructure)?;
        if offense.is_empty() && defense.is_empty() {
            Some(Outcome::Draw)
        } else if offense.is_empty() {
            Some(Outcome::DefenderWon)
        } else if defense.is_empty() {
            Some(Outcome::AttackerWon)
        } else {
            let resolved = battle.phases.resolved(&view)?;
            let next = battle.round + 1;
            if !can_fire(&view, &resolved, Side::Offense, next)?
                && !can_fire(&view, &resolved, Side::Defense, next)?
            {
                debug!(battle = %battle.id, "neither side can hit the other");
                Some(Outcome::Draw)
            } else if battle.rules.round_limit_reached(battle.round) {
                Some(Outcome::Draw)
            } else if !ctx.actions.query_continue(&view, Side::Offense)
                && !ctx.actions.query_continue(&view, Side::Defense)
            {
                Some(Outcome::Draw)
            } else {
                None
            }
        }
    };
    match outcome {
        Some(outcome) => end_battle(ctx.battle, ctx.bridge, outcome),
        None => Ok(()),
    }
}

fn offensive_retreat(ctx: &mut StepContext<'_, '_>) -> Result<(), BattleError> {
    if ctx.battle.retreat_sites.is_empty() || ctx.battle.amphibious {
        return Ok(());
    }
    let (to, units, text) = {
        let view = ctx.battle.view(ctx.bridge.state);
        let Some(to) = ctx
            .actions
            .query_retreat(&view, Side::Offense, &ctx.battle.retreat_sites)
        else {
            return Ok(());
        };
        if !ctx.battle.retreat_sites.contains(&to) {
            return Err(BattleError::InvalidRetreat(to));
        }
        let mut units = view.filter_units(UnitFilter::Alive, Side::Offense)?;
        units.extend(view.filter_units(UnitFilter::Submerged, Side::Offense)?);
        let text = format!(
            "{} retreat to {}",
            view.player_name(Side::Offense)?,
            view.game.site(to)?.name
        );
        (to, units, text)
    };
    ctx.bridge
        .history
        .record_event(&text, HistoryPayload::Units(units.clone()));
    ctx.actions
        .retreat_units(&units, ctx.bridge, ctx.battle.site, to)?;
    end_battle(ctx.battle, ctx.bridge, Outcome::DefenderWon)
}

fn next_round(stack: &mut ExecutionStack, ctx: &mut StepContext<'_, '_>) -> Result<(), BattleError> {
    ctx.battle.round += 1;
    debug!(battle = %ctx.battle.id, round = ctx.battle.round, "starting round");
    stack.push_all(round_steps(ctx.battle, ctx.bridge.state)?);
    Ok(())
}

/// Records the outcome and brings submerged units back up.
pub fn end_battle(battle: &mut Battle, bridge: &mut Bridge<'_>, outcome: Outcome) -> Result<(), BattleError> {
    battle.outcome = Some(outcome);
    let (submerged, text) = {
        let view = battle.view(bridge.state);
        let mut submerged = Vec::new();
        for side in Side::BOTH {
            submerged.extend(view.filter_units(UnitFilter::Submerged, side)?);
        }
        (submerged, format!("Battle in {}: {}", view.site_name()?, outcome))
    };
    if !submerged.is_empty() {
        let change = Change::submerge(bridge.state, &submerged, false, BTreeSet::from([battle.site]))?;
        bridge.perform(change)?;
    }
    info!(battle = %battle.id, %outcome, rounds = battle.round, "battle ended");
    bridge.history.record_event(&text, HistoryPayload::None);
    bridge.display.notify_battle_ended(battle.id, outcome);
    Ok(())
}
