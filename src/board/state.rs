//! Shared game-state arena.
//!
//! Holds every player, unit type, unit and site in indexed collections.
//! Everything else refers to them by handle, so a `Change` that names units
//! can be serialized and replayed without rebuilding a pointer graph.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::player::{Player, PlayerId};
use super::site::{BattleSite, SiteId};
use super::unit::{CombatUnit, UnitId, UnitType, UnitTypeId};

/// Errors raised when a handle does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),

    #[error("unknown unit type #{0}")]
    UnknownUnitType(u16),

    #[error("unknown player #{0}")]
    UnknownPlayer(u16),

    #[error("unknown site {0}")]
    UnknownSite(SiteId),
}

/// Complete shared state every battle reads from and every `Change` writes to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub players: Vec<Player>,
    pub unit_types: Vec<UnitType>,
    pub units: Vec<CombatUnit>,
    pub sites: Vec<BattleSite>,
    /// Sites notified since the last drain, in notification order.
    #[serde(skip)]
    notifications: Vec<SiteId>,
}

impl GameState {
    /// Creates an empty state.
    pub fn new() -> Self {
        GameState::default()
    }

    /// Registers a player and returns its id.
    pub fn add_player(&mut self, player: Player) -> PlayerId {
        self.players.push(player);
        PlayerId((self.players.len() - 1) as u16)
    }

    /// Registers a unit type and returns its id.
    pub fn add_unit_type(&mut self, unit_type: UnitType) -> UnitTypeId {
        self.unit_types.push(unit_type);
        UnitTypeId((self.unit_types.len() - 1) as u16)
    }

    /// Registers a site and returns its id.
    pub fn add_site(&mut self, site: BattleSite) -> SiteId {
        self.sites.push(site);
        SiteId((self.sites.len() - 1) as u16)
    }

    /// Creates `count` new units of a type at a site and returns their ids.
    ///
    /// Unit creation belongs to the surrounding game model, so this bypasses
    /// the mutation log.
    pub fn create_units(
        &mut self,
        unit_type: UnitTypeId,
        owner: PlayerId,
        count: usize,
        site: SiteId,
    ) -> Result<Vec<UnitId>, BoardError> {
        self.unit_type(unit_type)?;
        self.player(owner)?;
        self.site(site)?;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let id = UnitId(self.units.len() as u32);
            self.units.push(CombatUnit::new(id, unit_type, owner));
            self.sites[site.0 as usize].units.insert(id);
            ids.push(id);
        }
        Ok(ids)
    }

    /// Returns a player by id.
    pub fn player(&self, id: PlayerId) -> Result<&Player, BoardError> {
        self.players
            .get(id.0 as usize)
            .ok_or(BoardError::UnknownPlayer(id.0))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, BoardError> {
        self.players
            .get_mut(id.0 as usize)
            .ok_or(BoardError::UnknownPlayer(id.0))
    }

    /// Returns a unit type by id.
    pub fn unit_type(&self, id: UnitTypeId) -> Result<&UnitType, BoardError> {
        self.unit_types
            .get(id.0 as usize)
            .ok_or(BoardError::UnknownUnitType(id.0))
    }

    /// Returns a unit by id.
    pub fn unit(&self, id: UnitId) -> Result<&CombatUnit, BoardError> {
        self.units
            .get(id.0 as usize)
            .ok_or(BoardError::UnknownUnit(id))
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut CombatUnit, BoardError> {
        self.units
            .get_mut(id.0 as usize)
            .ok_or(BoardError::UnknownUnit(id))
    }

    /// Returns the type profile of a unit.
    pub fn type_of(&self, id: UnitId) -> Result<&UnitType, BoardError> {
        let unit = self.unit(id)?;
        self.unit_type(unit.unit_type)
    }

    /// Returns a site by id.
    pub fn site(&self, id: SiteId) -> Result<&BattleSite, BoardError> {
        self.sites
            .get(id.0 as usize)
            .ok_or(BoardError::UnknownSite(id))
    }

    pub fn site_mut(&mut self, id: SiteId) -> Result<&mut BattleSite, BoardError> {
        self.sites
            .get_mut(id.0 as usize)
            .ok_or(BoardError::UnknownSite(id))
    }

    /// Returns the id of the unit type named `name`.
    pub fn find_unit_type(&self, name: &str) -> Option<UnitTypeId> {
        self.unit_types
            .iter()
            .position(|t| t.name == name)
            .map(|i| UnitTypeId(i as u16))
    }

    /// Looks a player up by name.
    pub fn find_player(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .position(|p| p.name == name)
            .map(|i| PlayerId(i as u16))
    }

    /// Looks a site up by name.
    pub fn find_site(&self, name: &str) -> Option<SiteId> {
        self.sites
            .iter()
            .position(|s| s.name == name)
            .map(|i| SiteId(i as u16))
    }

    /// Records a synchronous change notification for a site.
    pub fn notify_site(&mut self, id: SiteId) -> Result<(), BoardError> {
        let site = self.site_mut(id)?;
        site.revision += 1;
        self.notifications.push(id);
        Ok(())
    }

    /// Takes every site notification recorded so far.
    pub fn drain_notifications(&mut self) -> Vec<SiteId> {
        std::mem::take(&mut self.notifications)
    }

    /// Returns every unit carried, directly or transitively, by `units`.
    ///
    /// Units already in `units` are never reported as dependents. The result
    /// is sorted by id.
    pub fn dependents(&self, units: &[UnitId]) -> Vec<UnitId> {
        let roots: BTreeSet<UnitId> = units.iter().copied().collect();
        let mut carriers = roots.clone();
        let mut found = BTreeSet::new();
        loop {
            let mut grew = false;
            for unit in &self.units {
                let Some(carrier) = unit.transported_by else {
                    continue;
                };
                if carriers.contains(&carrier) && !carriers.contains(&unit.id) {
                    carriers.insert(unit.id);
                    found.insert(unit.id);
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }
        found.into_iter().filter(|u| !roots.contains(u)).collect()
    }
}
