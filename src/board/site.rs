//! Battle sites (territories and sea zones).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::unit::UnitId;

/// Handle of a site in the `GameState` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiteId(pub u16);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// A location that can host a battle.
///
/// The unit set is ordered so that removing and re-adding units restores the
/// exact same observable contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSite {
    pub name: String,
    pub water: bool,
    pub units: BTreeSet<UnitId>,
    /// Bumped on every change notification touching this site.
    pub revision: u64,
}

impl BattleSite {
    /// Creates an empty site.
    pub fn new(name: &str, water: bool) -> Self {
        BattleSite {
            name: name.to_string(),
            water,
            units: BTreeSet::new(),
            revision: 0,
        }
    }
}
