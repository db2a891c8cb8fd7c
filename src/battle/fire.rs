//! Resolution of one fire step.

use std::collections::BTreeSet;

use tracing::{trace, warn};

use super::ability::{CombatValueType, UnitAbility};
use super::actions::BattleActions;
use super::bridge::Bridge;
use super::casualty::{kill_units, mark_casualties, select_casualties};
use super::firing::{split, FiringGroup};
use super::phase::FIRST_STRIKE;
use super::side::Side;
use super::state::{Battle, UnitFilter};
use super::BattleError;
use crate::board::{GameState, UnitId};
use crate::change::Change;
use crate::dice::{
    aa_annotation, aa_powers, roll_annotation, roll_dice, unit_powers, CombatValue, RollContext,
    RollStrategy, UnitPower,
};
use crate::history::{describe_units, HistoryPayload};

/// Fires every active ability `side` has in `phase`.
///
/// Groups are rolled in order. Targets killed by an earlier group are no
/// longer valid for later ones.
pub fn fire(
    battle: &mut Battle,
    bridge: &mut Bridge<'_>,
    actions: &mut dyn BattleActions,
    phase: &str,
    side: Side,
) -> Result<(), BattleError> {
    let abilities: Vec<UnitAbility> = {
        let view = battle.view(bridge.state);
        let resolved = battle.phases.resolved(&view)?;
        resolved
            .phase(phase)?
            .abilities_for(battle.player(side))
            .iter()
            .filter(|a| a.is_active(side, battle.round))
            .cloned()
            .collect()
    };
    if abilities.is_empty() {
        warn!(battle = %battle.id, phase, %side, "fire step with no active abilities");
    }
    for ability in &abilities {
        let groups = split(&battle.view(bridge.state), ability, side)?;
        trace!(ability = %ability.name, groups = groups.len(), "split firing groups");
        for group in &groups {
            resolve_group(battle, bridge, actions, phase, ability, side, group)?;
        }
    }
    Ok(())
}

fn resolve_group(
    battle: &mut Battle,
    bridge: &mut Bridge<'_>,
    actions: &mut dyn BattleActions,
    phase: &str,
    ability: &UnitAbility,
    side: Side,
    group: &FiringGroup,
) -> Result<(), BattleError> {
    let enemy = side.opposite();
    let dice_sides = battle.rules.dice_sides;
    let (targets, powers, strategy, annotation) = {
        let view = battle.view(bridge.state);
        let alive: BTreeSet<UnitId> = view.filter_units(UnitFilter::Alive, enemy)?.into_iter().collect();
        let targets: Vec<UnitId> = group.targets.iter().copied().filter(|t| alive.contains(t)).collect();
        if targets.is_empty() {
            return Ok(());
        }
        let player = view.player_name(side)?;
        let site = view.site_name()?;
        let (powers, strategy, annotation): (Vec<UnitPower>, RollStrategy, String) = match ability.combat_value {
            CombatValueType::Aa => {
                let value = match side {
                    Side::Offense => CombatValue::AaOffense,
                    Side::Defense => CombatValue::AaDefense,
                };
                (
                    aa_powers(view.game, &group.firing, value, targets.len() as u32, dice_sides)?,
                    RollStrategy::for_aa(&battle.rules),
                    aa_annotation(player, ability.type_aa.as_deref().unwrap_or("AA"), site),
                )
            }
            CombatValueType::Bombard | CombatValueType::Normal => {
                let value = match (ability.combat_value, side) {
                    (CombatValueType::Bombard, _) => CombatValue::Bombard,
                    (_, Side::Offense) => CombatValue::Offense,
                    (_, Side::Defense) => CombatValue::Defense,
                };
                let units = describe_units(view.game, &group.firing)?;
                (
                    unit_powers(view.game, &group.firing, value, dice_sides)?,
                    RollStrategy::for_combat(&battle.rules),
                    roll_annotation(player, &units, site, view.round()),
                )
            }
        };
        (targets, powers, strategy, annotation)
    };

    let ctx = RollContext {
        dice_sides,
        player: battle.player(side),
        annotation: &annotation,
    };
    let roll = roll_dice(strategy, &powers, ctx, bridge.random, bridge.history)?;
    if roll.hits == 0 {
        return Ok(());
    }

    let casualties = select_casualties(bridge.state, &targets, roll.hits, enemy)?;
    if !casualties.damaged.is_empty() {
        let change = Change::unit_hits(bridge.state, &casualties.damaged, BTreeSet::from([battle.site]))?;
        bridge.perform(change)?;
    }
    if !casualties.killed.is_empty() {
        let (waiting, doomed) = if ability.return_fire {
            (casualties.killed, Vec::new())
        } else if phase == FIRST_STRIKE {
            split_first_strike_kills(battle, bridge.state, enemy, &casualties.killed)?
        } else {
            (Vec::new(), casualties.killed)
        };
        if !waiting.is_empty() {
            let text = format!(
                "{} casualties: {}",
                battle.view(bridge.state).player_name(enemy)?,
                describe_units(bridge.state, &waiting)?
            );
            bridge
                .history
                .record_event(&text, HistoryPayload::Units(waiting.clone()));
            mark_casualties(battle, enemy, &waiting);
            if !ability.return_fire {
                battle.first_strike_casualties.extend(waiting.iter().copied());
            }
        }
        kill_units(battle, bridge, actions, enemy, &doomed)?;
    }
    if group.suicide_on_hit {
        let spent = (roll.hits as usize).min(group.firing.len());
        kill_units(battle, bridge, actions, side, &group.firing[..spent])?;
    }
    Ok(())
}

/// Splits units killed by first-strike fire into those that still fire back
/// in the first-strike phase and those removed at once.
fn split_first_strike_kills(
    battle: &Battle,
    game: &GameState,
    side: Side,
    killed: &[UnitId],
) -> Result<(Vec<UnitId>, Vec<UnitId>), BattleError> {
    let view = battle.view(game);
    let fires_back = battle.phases.resolved(&view)?.firing_types(FIRST_STRIKE, &view, side);
    let mut waiting = Vec::new();
    let mut doomed = Vec::new();
    for &id in killed {
        let unit_type = game.unit(id)?.unit_type;
        let first_strike = game.unit_type(unit_type)?.first_strike;
        if fires_back.contains(&unit_type) || (battle.rules.ww2v2 && first_strike) {
            waiting.push(id);
        } else {
            doomed.push(id);
        }
    }
    Ok((waiting, doomed))
}
