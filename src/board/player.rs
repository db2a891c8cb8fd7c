//! Players taking part in battles.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::unit::UnitTypeId;

/// Handle of a player in the `GameState` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u16);

/// A player and the technology that matters to combat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// AA type name -> unit types whose airborne units that AA type may target.
    #[serde(default)]
    pub airborne_targeted_by_aa: BTreeMap<String, BTreeSet<UnitTypeId>>,
}

impl Player {
    /// Creates a player with no combat technology.
    pub fn new(name: &str) -> Self {
        Player {
            name: name.to_string(),
            airborne_targeted_by_aa: BTreeMap::new(),
        }
    }

    /// Unit types of this player's airborne units targetable by `type_aa`.
    pub fn airborne_targets(&self, type_aa: &str) -> Option<&BTreeSet<UnitTypeId>> {
        self.airborne_targeted_by_aa.get(type_aa)
    }
}
