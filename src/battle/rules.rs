//! Game-rule flags that change how a battle is fought.

use serde::{Deserialize, Serialize};

/// Rule settings for one battle. Every field falls back to its default when
/// missing from a scenario file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleRules {
    pub dice_sides: u32,
    /// Resolve all combat with the low-luck strategy.
    pub low_luck: bool,
    /// Resolve only anti-air fire with the low-luck strategy.
    pub low_luck_aa_only: bool,
    /// Rounds fought before the battle is called a draw; 0 is unlimited.
    pub max_rounds: u32,
    /// Evading units may submerge at the start of a round.
    pub submersible_units: bool,
    /// Defending first-strike units keep first strike. Without it they fire
    /// with the general phase.
    pub defending_subs_sneak_attack: bool,
    /// Units hit by bombardment still fire in the general phase.
    pub bombard_casualties_return_fire: bool,
    /// WW2V2 rules: first-strike units hit by enemy first strike always get
    /// to fire back before they are removed.
    pub ww2v2: bool,
}

impl Default for BattleRules {
    fn default() -> Self {
        BattleRules {
            dice_sides: 6,
            low_luck: false,
            low_luck_aa_only: false,
            max_rounds: 0,
            submersible_units: true,
            defending_subs_sneak_attack: true,
            bombard_casualties_return_fire: true,
            ww2v2: false,
        }
    }
}

impl BattleRules {
    /// Returns true if the battle must stop after `round`.
    pub fn round_limit_reached(&self, round: u32) -> bool {
        self.max_rounds != 0 && round >= self.max_rounds
    }
}
