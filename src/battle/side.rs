use std::fmt;

use serde::{Deserialize, Serialize};

/// The two sides of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Offense,
    Defense,
}

impl Side {
    /// Both sides, offense first.
    pub const BOTH: [Side; 2] = [Side::Offense, Side::Defense];

    pub fn opposite(self) -> Side {
        match self {
            Side::Offense => Side::Defense,
            Side::Defense => Side::Offense,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Offense => write!(f, "offense"),
            Side::Defense => write!(f, "defense"),
        }
    }
}
