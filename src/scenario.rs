//! JSON battle scenarios.
//!
//! A scenario names everything by string: unit types, players and sites.
//! `Scenario::build` turns it into an arena and a ready-to-fight battle.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::{generate, Battle, BattleError, BattleId, BattleRules};
use crate::board::{BattleSite, BoardError, GameState, Player, PlayerId, SiteId, UnitId, UnitType, UnitTypeId};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown unit type {0:?}")]
    UnknownUnitType(String),
    #[error("unknown player {0:?}")]
    UnknownPlayer(String),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Battle(#[from] BattleError),
}

/// A unit type plus the names of the types its AA may target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioUnitType {
    #[serde(flatten)]
    pub unit_type: UnitType,
    #[serde(default)]
    pub aa_targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPlayer {
    pub name: String,
    /// AA type name -> unit type names whose airborne units it may target.
    #[serde(default)]
    pub airborne_targeted_by_aa: BTreeMap<String, Vec<String>>,
}

/// One side's units, counted by type name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Force {
    pub player: String,
    #[serde(default)]
    pub units: BTreeMap<String, usize>,
    /// Counts of `units` that arrived by air this turn.
    #[serde(default)]
    pub airborne: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub unit_types: Vec<ScenarioUnitType>,
    pub players: Vec<ScenarioPlayer>,
    pub site: String,
    #[serde(default)]
    pub water: bool,
    #[serde(default)]
    pub retreat_sites: Vec<String>,
    pub attacker: Force,
    pub defender: Force,
    /// Attacker units bombarding from offshore.
    #[serde(default)]
    pub bombarding: BTreeMap<String, usize>,
    #[serde(default)]
    pub amphibious: bool,
    #[serde(default)]
    pub rules: BattleRules,
}

pub fn load(path: &Path) -> Result<Scenario, ScenarioError> {
    let data = fs::read_to_string(path)?;
    from_json(&data)
}

pub fn from_json(json: &str) -> Result<Scenario, ScenarioError> {
    Ok(serde_json::from_str(json)?)
}

impl Scenario {
    /// Builds the game state and the battle it describes, with default
    /// abilities generated from the unit types.
    pub fn build(&self) -> Result<(GameState, Battle), ScenarioError> {
        let mut game = GameState::new();
        for entry in &self.unit_types {
            game.add_unit_type(entry.unit_type.clone());
        }
        for (i, entry) in self.unit_types.iter().enumerate() {
            if entry.aa_targets.is_empty() {
                continue;
            }
            let targets = type_ids(&game, &entry.aa_targets)?;
            game.unit_types[i].targets_aa = targets;
        }
        for entry in &self.players {
            let mut player = Player::new(&entry.name);
            for (type_aa, names) in &entry.airborne_targeted_by_aa {
                player
                    .airborne_targeted_by_aa
                    .insert(type_aa.clone(), type_ids(&game, names)?);
            }
            game.add_player(player);
        }

        let site = game.add_site(BattleSite::new(&self.site, self.water));
        let mut retreat_sites = Vec::with_capacity(self.retreat_sites.len());
        for name in &self.retreat_sites {
            retreat_sites.push(game.add_site(BattleSite::new(name, self.water)));
        }

        let attacker = player_id(&game, &self.attacker.player)?;
        let defender = player_id(&game, &self.defender.player)?;
        let offense = place(&mut game, &self.attacker, attacker, site)?;
        let defense = place(&mut game, &self.defender, defender, site)?;
        let mut bombarding = Vec::new();
        if !self.bombarding.is_empty() {
            let offshore = game.add_site(BattleSite::new(&format!("{} offshore", self.site), true));
            for (name, &count) in &self.bombarding {
                let unit_type = type_id(&game, name)?;
                bombarding.extend(game.create_units(unit_type, attacker, count, offshore)?);
            }
        }

        let phases = generate(&game, &[attacker, defender], &self.rules)?;
        let battle = Battle::new(
            BattleId(0),
            site,
            attacker,
            defender,
            offense,
            defense,
            phases,
            self.rules.clone(),
        )?
        .with_bombarding(bombarding)
        .with_retreat_sites(retreat_sites)
        .with_amphibious(self.amphibious);
        Ok((game, battle))
    }
}

fn type_id(game: &GameState, name: &str) -> Result<UnitTypeId, ScenarioError> {
    game.find_unit_type(name)
        .ok_or_else(|| ScenarioError::UnknownUnitType(name.to_string()))
}

fn type_ids(game: &GameState, names: &[String]) -> Result<BTreeSet<UnitTypeId>, ScenarioError> {
    names.iter().map(|n| type_id(game, n)).collect()
}

fn player_id(game: &GameState, name: &str) -> Result<PlayerId, ScenarioError> {
    game.find_player(name)
        .ok_or_else(|| ScenarioError::UnknownPlayer(name.to_string()))
}

fn place(game: &mut GameState, force: &Force, owner: PlayerId, site: SiteId) -> Result<Vec<UnitId>, ScenarioError> {
    let mut ids = Vec::new();
    for (name, &count) in &force.units {
        let unit_type = type_id(game, name)?;
        let created = game.create_units(unit_type, owner, count, site)?;
        let airborne = force.airborne.get(name).copied().unwrap_or(0).min(count);
        for &id in &created[..airborne] {
            game.unit_mut(id)?.airborne = true;
        }
        ids.extend(created);
    }
    Ok(ids)
}
