//! Firing groups.
//!
//! Units that roll together form a group. Suicide-on-hit units are split off
//! by unit type so each type's hits can be charged back to it; everyone else
//! fires as one group.

use std::collections::BTreeMap;

use super::ability::{CombatValueType, UnitAbility};
use super::phase::firing_candidates;
use super::side::Side;
use super::state::{BattleState, UnitFilter};
use super::BattleError;
use crate::board::{BoardError, GameState, UnitId, UnitTypeId};

/// Units rolling together and the units they may hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiringGroup {
    pub name: String,
    pub firing: Vec<UnitId>,
    pub targets: Vec<UnitId>,
    pub suicide_on_hit: bool,
    /// Unit type of a suicide-on-hit group.
    pub unit_type: Option<UnitTypeId>,
}

/// Partitions `firing` into groups that roll separately.
///
/// Each suicide-on-hit unit type gets its own group regardless of owner;
/// the remaining units form one final group. Nothing is returned when
/// there are no targets, and empty groups are never returned.
pub fn group_by_suicide_on_hit(
    game: &GameState,
    name: &str,
    firing: &[UnitId],
    targets: &[UnitId],
) -> Result<Vec<FiringGroup>, BoardError> {
    if targets.is_empty() || firing.is_empty() {
        return Ok(Vec::new());
    }
    let mut suicide: BTreeMap<UnitTypeId, Vec<UnitId>> = BTreeMap::new();
    let mut rest = Vec::new();
    for &unit in firing {
        let type_id = game.unit(unit)?.unit_type;
        if game.unit_type(type_id)?.suicide_on_hit {
            suicide.entry(type_id).or_default().push(unit);
        } else {
            rest.push(unit);
        }
    }

    let mut groups = Vec::with_capacity(suicide.len() + 1);
    for (type_id, units) in suicide {
        groups.push(FiringGroup {
            name: format!("{} {}", name, game.unit_type(type_id)?.name),
            firing: units,
            targets: targets.to_vec(),
            suicide_on_hit: true,
            unit_type: Some(type_id),
        });
    }
    if !rest.is_empty() {
        groups.push(FiringGroup {
            name: name.to_string(),
            firing: rest,
            targets: targets.to_vec(),
            suicide_on_hit: false,
            unit_type: None,
        });
    }
    Ok(groups)
}

/// Targets an ability of `side` may hit: alive, non-infrastructure enemy
/// units its target filter allows.
///
/// Defensive AA additionally hits airborne units of the types the
/// attacker's airborne tech exposes to that AA category.
pub fn valid_targets(
    view: &BattleState<'_>,
    ability: &UnitAbility,
    side: Side,
) -> Result<Vec<UnitId>, BattleError> {
    let enemy = side.opposite();
    let airborne = match (&ability.combat_value, &ability.type_aa, side) {
        (CombatValueType::Aa, Some(type_aa), Side::Defense) => view
            .game
            .player(view.player(enemy))?
            .airborne_targets(type_aa)
            .cloned()
            .unwrap_or_default(),
        _ => Default::default(),
    };

    let mut targets = Vec::new();
    for id in view.filter_units(UnitFilter::Alive, enemy)? {
        let unit = view.game.unit(id)?;
        if view.game.unit_type(unit.unit_type)?.is_infrastructure {
            continue;
        }
        if ability.targets.allows(unit.unit_type)
            || (unit.airborne && airborne.contains(&unit.unit_type))
        {
            targets.push(id);
        }
    }
    Ok(targets)
}

/// The firing groups of one ability.
pub fn split(
    view: &BattleState<'_>,
    ability: &UnitAbility,
    side: Side,
) -> Result<Vec<FiringGroup>, BattleError> {
    let firing = firing_candidates(view, ability, side)?;
    let targets = valid_targets(view, ability, side)?;
    Ok(group_by_suicide_on_hit(view.game, &ability.name, &firing, &targets)?)
}
