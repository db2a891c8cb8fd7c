//! Dice roll results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How one die counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieKind {
    Hit,
    Miss,
    /// Rolled but not counted (best-of-n losers, non-combat rolls).
    Ignored,
}

/// One die: the zero-based face rolled and the strength it was rolled at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Die {
    pub value: u32,
    pub rolled_at: u32,
    pub kind: DieKind,
}

impl Die {
    /// Scores a die: hits when the zero-based value is below the strength.
    pub fn scored(value: u32, rolled_at: u32) -> Self {
        let kind = if rolled_at > value {
            DieKind::Hit
        } else {
            DieKind::Miss
        };
        Die {
            value,
            rolled_at,
            kind,
        }
    }
}

/// The immutable outcome of one firing group's roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub dice: Vec<Die>,
    pub hits: u32,
    /// Dice the firing units were entitled to. Under low luck this exceeds
    /// `dice.len()` because only the remainder is physically rolled.
    pub total_rolls: u32,
    pub expected_hits: f64,
}

impl DiceRoll {
    /// A roll that drew nothing and hit nothing.
    pub fn empty() -> Self {
        DiceRoll {
            dice: Vec::new(),
            hits: 0,
            total_rolls: 0,
            expected_hits: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    /// Dice rolled at the given strength.
    pub fn rolls_at(&self, rolled_at: u32) -> Vec<Die> {
        self.dice
            .iter()
            .filter(|d| d.rolled_at == rolled_at)
            .copied()
            .collect()
    }
}

impl fmt::Display for DiceRoll {
    /// Formats the faces one-based, e.g. `1,4,6`, or `-` when nothing was rolled.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dice.is_empty() {
            return write!(f, "-");
        }
        let faces: Vec<String> = self.dice.iter().map(|d| (d.value + 1).to_string()).collect();
        write!(f, "{}", faces.join(","))
    }
}
