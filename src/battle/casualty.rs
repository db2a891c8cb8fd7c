//! Casualty selection and removal.

use tracing::debug;

use super::actions::BattleActions;
use super::bridge::Bridge;
use super::phase::FIRST_STRIKE;
use super::side::Side;
use super::state::{Battle, UnitFilter};
use super::BattleError;
use crate::board::{BoardError, GameState, UnitId};
use crate::history::{describe_units, HistoryPayload};

/// Units chosen to absorb a number of hits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Casualties {
    pub killed: Vec<UnitId>,
    /// Units that survive with more hits, and their new hit totals.
    pub damaged: Vec<(UnitId, u32)>,
}

impl Casualties {
    pub fn is_empty(&self) -> bool {
        self.killed.is_empty() && self.damaged.is_empty()
    }
}

/// Picks casualties for `hits` among `targets` of `side`.
///
/// Multi-hitpoint units soak hits first, down to their last hitpoint. Any
/// hits left kill the cheapest units, ordered by strength on their side,
/// then cost, then id.
pub fn select_casualties(
    game: &GameState,
    targets: &[UnitId],
    hits: u32,
    side: Side,
) -> Result<Casualties, BoardError> {
    let mut remaining = hits;
    let mut damaged = Vec::new();
    for &id in targets {
        if remaining == 0 {
            break;
        }
        let unit = game.unit(id)?;
        let hitpoints = game.unit_type(unit.unit_type)?.hitpoints;
        let spare = hitpoints.saturating_sub(1).saturating_sub(unit.hits);
        let taken = spare.min(remaining);
        if taken > 0 {
            damaged.push((id, unit.hits + taken));
            remaining -= taken;
        }
    }

    let mut ranked = targets
        .iter()
        .map(|&id| {
            let t = game.type_of(id)?;
            let strength = match side {
                Side::Offense => t.attack,
                Side::Defense => t.defense,
            };
            Ok((strength, t.cost, id))
        })
        .collect::<Result<Vec<_>, BoardError>>()?;
    ranked.sort();
    let killed: Vec<UnitId> = ranked
        .into_iter()
        .take(remaining as usize)
        .map(|(_, _, id)| id)
        .collect();
    damaged.retain(|(id, _)| !killed.contains(id));
    Ok(Casualties { killed, damaged })
}

/// Announces and removes units of one side, along with their dependents.
///
/// The display hears about the doomed units before the removal change is
/// committed. An empty batch does nothing.
pub fn kill_units(
    battle: &mut Battle,
    bridge: &mut Bridge<'_>,
    actions: &mut dyn BattleActions,
    side: Side,
    units: &[UnitId],
) -> Result<(), BattleError> {
    if units.is_empty() {
        return Ok(());
    }
    let (dependents, text) = {
        let view = battle.view(bridge.state);
        let dependents = view.dependents(units)?;
        let text = format!(
            "{} lose {} in {}",
            view.player_name(side)?,
            describe_units(bridge.state, units)?,
            view.site_name()?
        );
        (dependents, text)
    };
    debug!(battle = %battle.id, %side, count = units.len(), "removing units");
    bridge
        .display
        .notify_units_removed(battle.id, battle.player(side), units, &dependents);
    bridge
        .history
        .record_event(&text, HistoryPayload::Units(units.to_vec()));
    actions.remove_units(units, bridge, battle.site, side)?;
    let casualties = battle.casualties_mut(side);
    for unit in units.iter().chain(dependents.iter()) {
        casualties.remove(unit);
    }
    Ok(())
}

/// Removes firing suicide-on-attack units, offense first.
///
/// With `first_strike` set, only units that fire in the first-strike phase
/// this round go; otherwise only the rest. A first-strike unit whose ability
/// an enemy destroyer moved to the general phase counts with the rest.
pub fn remove_suicide_units(
    battle: &mut Battle,
    bridge: &mut Bridge<'_>,
    actions: &mut dyn BattleActions,
    first_strike: bool,
) -> Result<(), BattleError> {
    for side in Side::BOTH {
        let doomed = {
            let view = battle.view(bridge.state);
            let fires_first = battle.phases.resolved(&view)?.firing_types(FIRST_STRIKE, &view, side);
            let mut doomed = Vec::new();
            for id in view.filter_by_type(UnitFilter::Firing, side, |t| t.suicide_on_attack)? {
                if fires_first.contains(&view.game.unit(id)?.unit_type) == first_strike {
                    doomed.push(id);
                }
            }
            doomed
        };
        kill_units(battle, bridge, actions, side, &doomed)?;
    }
    Ok(())
}

/// Removes the first-strike casualties that were left to fire back, offense
/// first.
pub fn clear_first_strike_casualties(
    battle: &mut Battle,
    bridge: &mut Bridge<'_>,
    actions: &mut dyn BattleActions,
) -> Result<(), BattleError> {
    for side in Side::BOTH {
        let waiting: Vec<UnitId> = battle
            .view(bridge.state)
            .filter_units(UnitFilter::Casualty, side)?
            .into_iter()
            .filter(|u| battle.first_strike_casualties.contains(u))
            .collect();
        kill_units(battle, bridge, actions, side, &waiting)?;
    }
    battle.first_strike_casualties.clear();
    Ok(())
}

/// Removes every unit waiting to die, offense first.
pub fn clear_casualties(
    battle: &mut Battle,
    bridge: &mut Bridge<'_>,
    actions: &mut dyn BattleActions,
) -> Result<(), BattleError> {
    for side in Side::BOTH {
        let waiting = battle
            .view(bridge.state)
            .filter_units(UnitFilter::Casualty, side)?;
        kill_units(battle, bridge, actions, side, &waiting)?;
        // Entries for units that died some other way.
        battle.casualties_mut(side).clear();
    }
    battle.first_strike_casualties.clear();
    Ok(())
}

/// Marks units to die when casualties are next cleared.
pub fn mark_casualties(battle: &mut Battle, side: Side, units: &[UnitId]) {
    battle.casualties_mut(side).extend(units.iter().copied());
}
