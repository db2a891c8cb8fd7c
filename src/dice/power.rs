//! Per-unit strength and dice counts.

use serde::{Deserialize, Serialize};

use crate::board::{BoardError, GameState, UnitId, UnitType};

/// Which strength of a unit type is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatValue {
    Offense,
    Defense,
    Bombard,
    AaOffense,
    AaDefense,
}

impl CombatValue {
    pub fn strength(self, unit_type: &UnitType) -> u32 {
        match self {
            CombatValue::Offense => unit_type.attack,
            CombatValue::Defense => unit_type.defense,
            CombatValue::Bombard => unit_type.bombard,
            CombatValue::AaOffense => unit_type.offensive_attack_aa,
            CombatValue::AaDefense => unit_type.attack_aa,
        }
    }

    /// Dice per unit. AA dice depend on the number of targets and are
    /// computed by `aa_powers` instead.
    pub fn rolls(self, unit_type: &UnitType) -> u32 {
        match self {
            CombatValue::Offense | CombatValue::Bombard => unit_type.attack_rolls,
            CombatValue::Defense => unit_type.defense_rolls,
            CombatValue::AaOffense | CombatValue::AaDefense => 1,
        }
    }

    pub fn is_aa(self) -> bool {
        matches!(self, CombatValue::AaOffense | CombatValue::AaDefense)
    }
}

/// Strength and dice of one firing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPower {
    pub unit: UnitId,
    /// Clamped to `[0, dice_sides]`.
    pub strength: u32,
    pub rolls: u32,
    pub choose_best_roll: bool,
}

impl UnitPower {
    fn is_active(&self) -> bool {
        self.strength > 0 && self.rolls > 0
    }
}

/// Powers for ordinary fire, weakest first so dice are consumed in a stable
/// order.
pub fn unit_powers(
    state: &GameState,
    units: &[UnitId],
    value: CombatValue,
    dice_sides: u32,
) -> Result<Vec<UnitPower>, BoardError> {
    let mut powers = units
        .iter()
        .map(|&unit| {
            let unit_type = state.type_of(unit)?;
            Ok(UnitPower {
                unit,
                strength: value.strength(unit_type).min(dice_sides),
                rolls: value.rolls(unit_type),
                choose_best_roll: unit_type.choose_best_roll && !value.is_aa(),
            })
        })
        .collect::<Result<Vec<_>, BoardError>>()?;
    powers.sort_by_key(|p| (p.strength, p.unit));
    Ok(powers)
}

/// Powers for anti-air fire.
///
/// AA units are taken strongest first. Each rolls one die per remaining
/// target, up to its `max_aa_attacks`, so stronger guns claim the targets
/// before weaker ones. Units left with no targets roll nothing.
pub fn aa_powers(
    state: &GameState,
    aa_units: &[UnitId],
    value: CombatValue,
    target_count: u32,
    dice_sides: u32,
) -> Result<Vec<UnitPower>, BoardError> {
    let mut ranked = aa_units
        .iter()
        .map(|&unit| {
            let unit_type = state.type_of(unit)?;
            Ok((unit, value.strength(unit_type).min(dice_sides), unit_type.max_aa_attacks))
        })
        .collect::<Result<Vec<_>, BoardError>>()?;
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut remaining = target_count;
    Ok(ranked
        .into_iter()
        .map(|(unit, strength, max_attacks)| {
            let rolls = max_attacks.map_or(remaining, |max| max.min(remaining));
            remaining -= rolls;
            UnitPower {
                unit,
                strength,
                rolls,
                choose_best_roll: false,
            }
        })
        .collect())
}

/// Aggregate power and dice of a firing group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TotalPowerAndRolls {
    pub total_power: u32,
    pub total_rolls: u32,
}

impl TotalPowerAndRolls {
    /// Sums the group. Units with zero strength or zero dice contribute
    /// nothing.
    ///
    /// A choose-best-roll unit counts as one die at its strength plus a bonus
    /// of `max(1, sides / 6)` for each extra die, capped at the dice sides.
    pub fn of(powers: &[UnitPower], dice_sides: u32) -> Self {
        let bonus = (dice_sides / 6).max(1);
        let mut total = TotalPowerAndRolls::default();
        for p in powers.iter().filter(|p| p.is_active()) {
            total.total_rolls += p.rolls;
            total.total_power += if p.choose_best_roll && p.rolls > 1 {
                (p.strength + bonus * (p.rolls - 1)).min(dice_sides)
            } else {
                p.strength * p.rolls
            };
        }
        total
    }

    /// The units that actually roll.
    pub fn active(powers: &[UnitPower]) -> impl Iterator<Item = &UnitPower> {
        powers.iter().filter(|p| p.is_active())
    }
}
