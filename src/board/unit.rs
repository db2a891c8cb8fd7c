//! Unit types and combat units.
//!
//! A `UnitType` carries the static combat profile (strength, dice, special
//! flags). A `CombatUnit` is one concrete participant, referenced everywhere
//! by its `UnitId` handle into the `GameState` arena.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// Handle of a unit type in the `GameState` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitTypeId(pub u16);

/// Handle of a combat unit in the `GameState` arena. Immutable for the
/// lifetime of the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Static combat profile shared by every unit of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitType {
    pub name: String,
    pub attack: u32,
    pub defense: u32,
    pub attack_rolls: u32,
    pub defense_rolls: u32,
    /// Hits a unit absorbs before dying. One for ordinary units.
    pub hitpoints: u32,
    /// Production cost; breaks ties when choosing casualties.
    pub cost: u32,
    pub is_air: bool,
    pub is_sea: bool,
    /// Infrastructure never fights and never counts as a combatant.
    pub is_infrastructure: bool,
    /// Removed after scoring a hit, one unit per hit.
    pub suicide_on_hit: bool,
    /// Removed after firing, whether or not it hit.
    pub suicide_on_attack: bool,
    pub first_strike: bool,
    /// May submerge out of combat at the start of a round.
    pub can_evade: bool,
    /// Presence on the enemy side cancels the enemy's first strike.
    pub is_destroyer: bool,
    pub can_bombard: bool,
    /// Bombardment strength.
    pub bombard: u32,
    pub is_aa: bool,
    /// Name of the anti-air category; AA units of one category fire together.
    pub type_aa: String,
    /// Defensive AA strength.
    pub attack_aa: u32,
    pub offensive_attack_aa: u32,
    /// Dice per AA unit; `None` rolls one die per valid target.
    pub max_aa_attacks: Option<u32>,
    /// Last round the AA may fire; `None` fires every round.
    pub max_rounds_aa: Option<u32>,
    pub targets_aa: BTreeSet<UnitTypeId>,
    /// With several dice, only the best die counts.
    pub choose_best_roll: bool,
}

impl Default for UnitType {
    fn default() -> Self {
        UnitType {
            name: String::new(),
            attack: 0,
            defense: 0,
            attack_rolls: 1,
            defense_rolls: 1,
            hitpoints: 1,
            cost: 0,
            is_air: false,
            is_sea: false,
            is_infrastructure: false,
            suicide_on_hit: false,
            suicide_on_attack: false,
            first_strike: false,
            can_evade: false,
            is_destroyer: false,
            can_bombard: false,
            bombard: 0,
            is_aa: false,
            type_aa: String::new(),
            attack_aa: 0,
            offensive_attack_aa: 0,
            max_aa_attacks: Some(1),
            max_rounds_aa: Some(1),
            targets_aa: BTreeSet::new(),
            choose_best_roll: false,
        }
    }
}

impl UnitType {
    /// Creates a unit type with the given name and attack/defense strength.
    pub fn new(name: &str, attack: u32, defense: u32) -> Self {
        UnitType {
            name: name.to_string(),
            attack,
            defense,
            ..UnitType::default()
        }
    }

    /// Returns true if the AA of this type may still fire in `round` (1-based).
    pub fn aa_fires_in_round(&self, round: u32) -> bool {
        self.max_rounds_aa.map_or(true, |max| round <= max)
    }
}

/// One participant in battle.
///
/// Units are never deleted; removal is the `alive` flag flipping through a
/// `Change`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatUnit {
    pub id: UnitId,
    pub unit_type: UnitTypeId,
    pub owner: PlayerId,
    /// Accumulated hits taken.
    pub hits: u32,
    /// Accumulated damage level (bombing damage on infrastructure).
    pub damage: u32,
    pub alive: bool,
    pub submerged: bool,
    /// Landed by air this turn.
    pub airborne: bool,
    /// The unit carrying this one, if it is cargo.
    pub transported_by: Option<UnitId>,
}

impl CombatUnit {
    /// Creates a fresh, undamaged, alive unit.
    pub fn new(id: UnitId, unit_type: UnitTypeId, owner: PlayerId) -> Self {
        CombatUnit {
            id,
            unit_type,
            owner,
            hits: 0,
            damage: 0,
            alive: true,
            submerged: false,
            airborne: false,
            transported_by: None,
        }
    }
}
