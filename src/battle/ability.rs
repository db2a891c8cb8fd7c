//! Unit abilities.
//!
//! An ability is a declarative capability ("may fire as AA against air",
//! "fires in the first-strike phase") attached to a set of unit types. Phases
//! hold abilities per player; the firing step reads them to decide who
//! fires at whom.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::phase::{BattlePhaseList, AA, BOMBARD, FIRST_STRIKE, GENERAL};
use super::rules::BattleRules;
use super::side::Side;
use super::BattleError;
use crate::board::{GameState, PlayerId, UnitType, UnitTypeId};

/// Which strength an ability rolls with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatValueType {
    Normal,
    Aa,
    Bombard,
}

/// Units an ability may hit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Targets {
    All,
    Types(BTreeSet<UnitTypeId>),
}

impl Targets {
    pub fn allows(&self, unit_type: UnitTypeId) -> bool {
        match self {
            Targets::All => true,
            Targets::Types(types) => types.contains(&unit_type),
        }
    }
}

/// A combat capability attached to unit types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitAbility {
    pub name: String,
    pub attached: BTreeSet<UnitTypeId>,
    pub sides: BTreeSet<Side>,
    pub combat_value: CombatValueType,
    pub targets: Targets,
    /// AA category; AA abilities of different categories never fire together.
    pub type_aa: Option<String>,
    /// Last round the ability fires in; `None` fires every round.
    pub last_round: Option<u32>,
    /// Units this ability kills keep firing until casualties are cleared.
    pub return_fire: bool,
}

impl UnitAbility {
    /// A normal-strength ability on both sides with no attached types.
    pub fn new(name: &str) -> Self {
        UnitAbility {
            name: name.to_string(),
            attached: BTreeSet::new(),
            sides: BTreeSet::from(Side::BOTH),
            combat_value: CombatValueType::Normal,
            targets: Targets::All,
            type_aa: None,
            last_round: None,
            return_fire: true,
        }
    }

    pub fn attach(mut self, types: impl IntoIterator<Item = UnitTypeId>) -> Self {
        self.attached.extend(types);
        self
    }

    pub fn on_sides(mut self, sides: impl IntoIterator<Item = Side>) -> Self {
        self.sides = sides.into_iter().collect();
        self
    }

    pub fn with_value(mut self, combat_value: CombatValueType) -> Self {
        self.combat_value = combat_value;
        self
    }

    pub fn targeting(mut self, targets: Targets) -> Self {
        self.targets = targets;
        self
    }

    pub fn until_round(mut self, last_round: Option<u32>) -> Self {
        self.last_round = last_round;
        self
    }

    pub fn with_return_fire(mut self, return_fire: bool) -> Self {
        self.return_fire = return_fire;
        self
    }

    /// True when both abilities differ at most in their attached types.
    pub fn same_except_attached(&self, other: &UnitAbility) -> bool {
        self.name == other.name
            && self.sides == other.sides
            && self.combat_value == other.combat_value
            && self.targets == other.targets
            && self.type_aa == other.type_aa
            && self.last_round == other.last_round
            && self.return_fire == other.return_fire
    }

    /// True if the ability fires for `side` in `round`.
    pub fn is_active(&self, side: Side, round: u32) -> bool {
        self.sides.contains(&side) && self.last_round.map_or(true, |last| round <= last)
    }
}

/// Whose abilities a conversion rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Friendly,
    Foe,
}

/// Replaces one ability with another while a unit of the attached types is
/// present on the owner's side.
///
/// The unit types attached to the replaced ability move to the replacement.
/// With no replacement the ability is simply removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertUnitAbility {
    pub name: String,
    pub attached: BTreeSet<UnitTypeId>,
    pub team: Team,
    pub from_phase: String,
    pub from: UnitAbility,
    pub to_phase: String,
    pub to: Option<UnitAbility>,
}

fn strength_sides(attack: u32, defense: u32) -> Vec<Side> {
    let mut sides = Vec::new();
    if attack > 0 {
        sides.push(Side::Offense);
    }
    if defense > 0 {
        sides.push(Side::Defense);
    }
    sides
}

/// Builds the default abilities for `players` from the unit types of the game.
///
/// AA types fire in the AA phase, bombarding types in the bombard phase of
/// the first round, first-strike types in the first-strike phase and the rest
/// in the general phase. Defending first-strike units without sneak attack
/// fire with the general phase, or under WW2V2 rules still fire first but
/// let their victims fire back. When destroyers exist, every player gets a
/// conversion that moves enemy first-strike abilities into the general phase
/// while one of its destroyers is present.
pub fn generate(
    game: &GameState,
    players: &[PlayerId],
    rules: &BattleRules,
) -> Result<BattlePhaseList, BattleError> {
    let mut list = BattlePhaseList::with_default_phases();
    let all_types: Vec<(UnitTypeId, &UnitType)> = game
        .unit_types
        .iter()
        .enumerate()
        .map(|(i, t)| (UnitTypeId(i as u16), t))
        .collect();
    let non_air: BTreeSet<UnitTypeId> = all_types
        .iter()
        .filter(|(_, t)| !t.is_air)
        .map(|(id, _)| *id)
        .collect();
    let destroyers: BTreeSet<UnitTypeId> = all_types
        .iter()
        .filter(|(_, t)| t.is_destroyer)
        .map(|(id, _)| *id)
        .collect();

    let mut first_strike = Vec::new();
    for &player in players {
        for &(id, t) in &all_types {
            for (phase, ability) in abilities_for_type(id, t, rules, &non_air) {
                if phase == FIRST_STRIKE {
                    first_strike.push(ability.clone());
                }
                list.add_ability_or_merge(phase, player, ability)?;
            }
        }
    }

    if !destroyers.is_empty() {
        let mut seen: Vec<UnitAbility> = Vec::new();
        for ability in first_strike {
            let mut from = ability;
            from.attached.clear();
            if seen.contains(&from) {
                continue;
            }
            seen.push(from.clone());
            let to = UnitAbility {
                name: format!("{} (neutralized)", from.name),
                return_fire: true,
                ..from.clone()
            };
            for &player in players {
                list.add_conversion(
                    player,
                    ConvertUnitAbility {
                        name: format!("neutralize {}", from.name),
                        attached: destroyers.clone(),
                        team: Team::Foe,
                        from_phase: FIRST_STRIKE.to_string(),
                        from: from.clone(),
                        to_phase: GENERAL.to_string(),
                        to: Some(to.clone()),
                    },
                );
            }
        }
    }
    debug!(players = players.len(), "generated unit abilities");
    Ok(list)
}

fn abilities_for_type(
    id: UnitTypeId,
    t: &UnitType,
    rules: &BattleRules,
    non_air: &BTreeSet<UnitTypeId>,
) -> Vec<(&'static str, UnitAbility)> {
    let mut out = Vec::new();
    if t.is_aa && !t.targets_aa.is_empty() {
        let sides = strength_sides(t.offensive_attack_aa, t.attack_aa);
        if !sides.is_empty() {
            let mut ability = UnitAbility::new(&format!("{} fire", t.type_aa))
                .attach([id])
                .on_sides(sides)
                .with_value(CombatValueType::Aa)
                .targeting(Targets::Types(t.targets_aa.clone()))
                .until_round(t.max_rounds_aa)
                .with_return_fire(false);
            ability.type_aa = Some(t.type_aa.clone());
            out.push((AA, ability));
        }
    }
    if t.can_bombard && t.bombard > 0 {
        out.push((
            BOMBARD,
            UnitAbility::new("bombard")
                .attach([id])
                .on_sides([Side::Offense])
                .with_value(CombatValueType::Bombard)
                .until_round(Some(1))
                .with_return_fire(rules.bombard_casualties_return_fire),
        ));
    }
    if t.is_infrastructure {
        return out;
    }
    if t.first_strike {
        let mut first = Vec::new();
        let mut first_with_return_fire = Vec::new();
        let mut general = Vec::new();
        if t.attack > 0 {
            first.push(Side::Offense);
        }
        if t.defense > 0 {
            if rules.defending_subs_sneak_attack {
                first.push(Side::Defense);
            } else if rules.ww2v2 {
                first_with_return_fire.push(Side::Defense);
            } else {
                general.push(Side::Defense);
            }
        }
        if !first.is_empty() {
            out.push((
                FIRST_STRIKE,
                UnitAbility::new("first strike")
                    .attach([id])
                    .on_sides(first)
                    .targeting(Targets::Types(non_air.clone()))
                    .with_return_fire(false),
            ));
        }
        if !first_with_return_fire.is_empty() {
            out.push((
                FIRST_STRIKE,
                UnitAbility::new("first strike")
                    .attach([id])
                    .on_sides(first_with_return_fire)
                    .targeting(Targets::Types(non_air.clone())),
            ));
        }
        if !general.is_empty() {
            out.push((
                GENERAL,
                UnitAbility::new("first strike")
                    .attach([id])
                    .on_sides(general)
                    .targeting(Targets::Types(non_air.clone())),
            ));
        }
    } else {
        let sides = strength_sides(t.attack, t.defense);
        if !sides.is_empty() {
            out.push((GENERAL, UnitAbility::new("fire").attach([id]).on_sides(sides)));
        }
    }
    out
}
