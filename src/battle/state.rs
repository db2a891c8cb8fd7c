//! Battle bookkeeping and the read-only view over it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::phase::BattlePhaseList;
use super::rules::BattleRules;
use super::side::Side;
use super::BattleError;
use crate::board::{BoardError, GameState, PlayerId, SiteId, UnitId, UnitType};

/// Identity of one battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BattleId(pub u32);

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    AttackerWon,
    DefenderWon,
    Draw,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::AttackerWon => write!(f, "attacker won"),
            Outcome::DefenderWon => write!(f, "defender won"),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

/// Which units of a side a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitFilter {
    /// Alive, present at the site, surfaced, and not waiting to die.
    Alive,
    /// Hit this round and waiting for casualties to be cleared.
    Casualty,
    /// Alive or waiting to die; the units allowed to fire.
    Firing,
    /// Alive and submerged out of combat.
    Submerged,
    /// Every unit that ever fought on the side.
    All,
}

/// One battle between an attacker and a defender at a site.
///
/// Unit membership is fixed when the battle is created; liveness comes from
/// the game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    pub id: BattleId,
    pub site: SiteId,
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub offense: Vec<UnitId>,
    pub defense: Vec<UnitId>,
    /// Units firing from outside the site during the bombard phase.
    pub bombarding: Vec<UnitId>,
    pub amphibious: bool,
    /// 1-based.
    pub round: u32,
    pub offense_casualties: BTreeSet<UnitId>,
    pub defense_casualties: BTreeSet<UnitId>,
    /// Casualties of first-strike fire, removed once the first-strike phase
    /// is over.
    #[serde(default)]
    pub first_strike_casualties: BTreeSet<UnitId>,
    pub retreat_sites: Vec<SiteId>,
    pub phases: BattlePhaseList,
    pub rules: BattleRules,
    pub outcome: Option<Outcome>,
}

impl Battle {
    /// Creates a battle in its first round. A unit listed on both sides is
    /// rejected.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BattleId,
        site: SiteId,
        attacker: PlayerId,
        defender: PlayerId,
        offense: Vec<UnitId>,
        defense: Vec<UnitId>,
        phases: BattlePhaseList,
        rules: BattleRules,
    ) -> Result<Battle, BattleError> {
        let mut seen = BTreeSet::new();
        for &unit in offense.iter().chain(defense.iter()) {
            if !seen.insert(unit) {
                return Err(BattleError::DuplicateUnit(unit));
            }
        }
        Ok(Battle {
            id,
            site,
            attacker,
            defender,
            offense,
            defense,
            bombarding: Vec::new(),
            amphibious: false,
            round: 1,
            offense_casualties: BTreeSet::new(),
            defense_casualties: BTreeSet::new(),
            first_strike_casualties: BTreeSet::new(),
            retreat_sites: Vec::new(),
            phases,
            rules,
            outcome: None,
        })
    }

    /// Sets the sea units bombarding from outside the site.
    pub fn with_bombarding(mut self, units: Vec<UnitId>) -> Self {
        self.bombarding = units;
        self
    }

    /// Sets the sites the attacker may retreat to.
    pub fn with_retreat_sites(mut self, sites: Vec<SiteId>) -> Self {
        self.retreat_sites = sites;
        self
    }

    /// Marks the battle as an amphibious assault.
    pub fn with_amphibious(mut self, amphibious: bool) -> Self {
        self.amphibious = amphibious;
        self
    }

    /// Returns the player fighting on `side`.
    pub fn player(&self, side: Side) -> PlayerId {
        match side {
            Side::Offense => self.attacker,
            Side::Defense => self.defender,
        }
    }

    /// The side a player fights on, if any.
    pub fn side_of(&self, player: PlayerId) -> Option<Side> {
        Side::BOTH.into_iter().find(|&side| self.player(side) == player)
    }

    /// Returns the units a side brought into the battle.
    pub fn units(&self, side: Side) -> &[UnitId] {
        match side {
            Side::Offense => &self.offense,
            Side::Defense => &self.defense,
        }
    }

    /// Returns the units of `side` hit and waiting to be removed.
    pub fn casualties(&self, side: Side) -> &BTreeSet<UnitId> {
        match side {
            Side::Offense => &self.offense_casualties,
            Side::Defense => &self.defense_casualties,
        }
    }

    /// Returns the waiting casualties of `side` for updating.
    pub fn casualties_mut(&mut self, side: Side) -> &mut BTreeSet<UnitId> {
        match side {
            Side::Offense => &mut self.offense_casualties,
            Side::Defense => &mut self.defense_casualties,
        }
    }

    /// Returns true once an outcome has been recorded.
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Returns a read-only view of the battle over `game`.
    pub fn view<'a>(&'a self, game: &'a GameState) -> BattleState<'a> {
        BattleState { battle: self, game }
    }
}

/// Read-only query surface over one battle and the game state it lives in.
#[derive(Debug, Clone, Copy)]
pub struct BattleState<'a> {
    pub battle: &'a Battle,
    pub game: &'a GameState,
}

impl<'a> BattleState<'a> {
    /// Returns the id of the battle.
    pub fn battle_id(&self) -> BattleId {
        self.battle.id
    }

    /// Returns the current round, starting at 1.
    pub fn round(&self) -> u32 {
        self.battle.round
    }

    /// Returns the site the battle is fought at.
    pub fn site(&self) -> SiteId {
        self.battle.site
    }

    /// Returns the player fighting on `side`.
    pub fn player(&self, side: Side) -> PlayerId {
        self.battle.player(side)
    }

    /// Returns the display name of the player on `side`.
    pub fn player_name(&self, side: Side) -> Result<&'a str, BoardError> {
        Ok(self.game.player(self.battle.player(side))?.name.as_str())
    }

    /// Returns the display name of the battle site.
    pub fn site_name(&self) -> Result<&'a str, BoardError> {
        Ok(self.game.site(self.battle.site)?.name.as_str())
    }

    /// Returns the type profile of a unit.
    pub fn unit_type(&self, unit: UnitId) -> Result<&'a UnitType, BoardError> {
        self.game.type_of(unit)
    }

    /// Units of one side matching the filter, in battle order.
    pub fn filter_units(&self, filter: UnitFilter, side: Side) -> Result<Vec<UnitId>, BoardError> {
        let present = &self.game.site(self.battle.site)?.units;
        let waiting = self.battle.casualties(side);
        let mut out = Vec::new();
        for &id in self.battle.units(side) {
            let unit = self.game.unit(id)?;
            let here = unit.alive && present.contains(&id);
            let keep = match filter {
                UnitFilter::Alive => here && !unit.submerged && !waiting.contains(&id),
                UnitFilter::Casualty => here && waiting.contains(&id),
                UnitFilter::Firing => here && !unit.submerged,
                UnitFilter::Submerged => here && unit.submerged,
                UnitFilter::All => true,
            };
            if keep {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// Alive units of a side whose type passes `pred`.
    pub fn filter_by_type(
        &self,
        filter: UnitFilter,
        side: Side,
        pred: impl Fn(&UnitType) -> bool,
    ) -> Result<Vec<UnitId>, BoardError> {
        let mut out = Vec::new();
        for id in self.filter_units(filter, side)? {
            if pred(self.game.type_of(id)?) {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// Bombarding units still alive.
    pub fn bombarding(&self) -> Result<Vec<UnitId>, BoardError> {
        let mut out = Vec::new();
        for &id in &self.battle.bombarding {
            if self.game.unit(id)?.alive {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// Units carried by `units`, transitively, that are still alive.
    pub fn dependents(&self, units: &[UnitId]) -> Result<Vec<UnitId>, BoardError> {
        let mut out = Vec::new();
        for id in self.game.dependents(units) {
            if self.game.unit(id)?.alive {
                out.push(id);
            }
        }
        Ok(out)
    }
}
