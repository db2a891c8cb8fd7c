//! Battle phases.
//!
//! A round visits phases in ascending sort order. Each phase owns, per
//! player, the abilities active in it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ability::{CombatValueType, ConvertUnitAbility, Team, UnitAbility};
use super::side::Side;
use super::state::{BattleState, UnitFilter};
use super::step::BattleStep;
use super::BattleError;
use crate::board::{PlayerId, UnitId, UnitTypeId};

pub const AA: &str = "AA";
pub const BOMBARD: &str = "Bombard";
pub const FIRST_STRIKE: &str = "First Strike";
pub const GENERAL: &str = "General";

pub const AA_ORDER: u32 = 100;
pub const BOMBARD_ORDER: u32 = 200;
pub const FIRST_STRIKE_ORDER: u32 = 300;
pub const GENERAL_ORDER: u32 = 400;

/// A named phase with its sort key and per-player abilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlePhase {
    pub name: String,
    pub order: u32,
    pub abilities: BTreeMap<PlayerId, Vec<UnitAbility>>,
    /// Registered step handlers run after this phase's fire steps.
    pub custom_steps: Vec<String>,
}

impl BattlePhase {
    pub fn new(name: &str, order: u32) -> Self {
        BattlePhase {
            name: name.to_string(),
            order,
            abilities: BTreeMap::new(),
            custom_steps: Vec::new(),
        }
    }

    pub fn abilities_for(&self, player: PlayerId) -> &[UnitAbility] {
        self.abilities.get(&player).map_or(&[], Vec::as_slice)
    }

    /// Adds an ability, merging it into an existing one that differs only in
    /// attached unit types.
    pub fn add_ability_or_merge_attached(&mut self, player: PlayerId, ability: UnitAbility) {
        let abilities = self.abilities.entry(player).or_default();
        match abilities.iter_mut().find(|a| a.same_except_attached(&ability)) {
            Some(existing) => existing.attached.extend(ability.attached),
            None => abilities.push(ability),
        }
    }

    /// Detaches the unit types `from` covers from the matching ability of a
    /// player and returns them. An ability left with no types is dropped.
    fn take_attached(&mut self, player: PlayerId, from: &UnitAbility) -> BTreeSet<UnitTypeId> {
        let Some(abilities) = self.abilities.get_mut(&player) else {
            return BTreeSet::new();
        };
        let Some(index) = abilities.iter().position(|a| a.same_except_attached(from)) else {
            return BTreeSet::new();
        };
        let ability = &mut abilities[index];
        let moved: BTreeSet<UnitTypeId> = if from.attached.is_empty() {
            ability.attached.clone()
        } else {
            ability.attached.intersection(&from.attached).copied().collect()
        };
        ability.attached.retain(|t| !moved.contains(t));
        if ability.attached.is_empty() {
            abilities.remove(index);
        }
        moved
    }

    /// Fire steps for every side that has units carrying one of its active
    /// abilities, offense first, followed by the phase's custom steps.
    pub fn steps_for(&self, view: &BattleState<'_>) -> Result<Vec<BattleStep>, BattleError> {
        let mut steps = Vec::new();
        for side in Side::BOTH {
            let mut fires = false;
            for ability in self.abilities_for(view.player(side)) {
                if ability.is_active(side, view.round())
                    && !firing_candidates(view, ability, side)?.is_empty()
                {
                    fires = true;
                    break;
                }
            }
            if fires {
                steps.push(BattleStep::Fire {
                    phase: self.name.clone(),
                    side,
                });
            }
        }
        steps.extend(self.custom_steps.iter().cloned().map(BattleStep::Custom));
        Ok(steps)
    }
}

/// Units of `side` that carry `ability`. Bombard abilities draw on the
/// bombarding units instead of the side's own.
pub fn firing_candidates(
    view: &BattleState<'_>,
    ability: &UnitAbility,
    side: Side,
) -> Result<Vec<UnitId>, BattleError> {
    let pool = match ability.combat_value {
        CombatValueType::Bombard if side == Side::Offense => view.bombarding()?,
        CombatValueType::Bombard => Vec::new(),
        _ => view.filter_units(UnitFilter::Firing, side)?,
    };
    let mut out = Vec::new();
    for id in pool {
        if ability.attached.contains(&view.game.unit(id)?.unit_type) {
            out.push(id);
        }
    }
    Ok(out)
}

/// Phases in ascending sort order plus the conversions that rewrite them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BattlePhaseList {
    phases: Vec<BattlePhase>,
    conversions: Vec<(PlayerId, ConvertUnitAbility)>,
}

impl BattlePhaseList {
    pub fn new() -> Self {
        BattlePhaseList::default()
    }

    /// AA, bombard, first strike and general, with no abilities.
    pub fn with_default_phases() -> Self {
        BattlePhaseList {
            phases: vec![
                BattlePhase::new(AA, AA_ORDER),
                BattlePhase::new(BOMBARD, BOMBARD_ORDER),
                BattlePhase::new(FIRST_STRIKE, FIRST_STRIKE_ORDER),
                BattlePhase::new(GENERAL, GENERAL_ORDER),
            ],
            conversions: Vec::new(),
        }
    }

    /// Adds a phase, keeping the list sorted. Phases with equal sort keys
    /// keep insertion order.
    pub fn add_phase(&mut self, name: &str, order: u32) -> Result<(), BattleError> {
        if self.phases.iter().any(|p| p.name == name) {
            return Err(BattleError::DuplicatePhase(name.to_string()));
        }
        let index = self.phases.partition_point(|p| p.order <= order);
        self.phases.insert(index, BattlePhase::new(name, order));
        Ok(())
    }

    pub fn phases(&self) -> &[BattlePhase] {
        &self.phases
    }

    pub fn phase(&self, name: &str) -> Result<&BattlePhase, BattleError> {
        self.phases
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| BattleError::UnknownPhase(name.to_string()))
    }

    pub fn phase_mut(&mut self, name: &str) -> Result<&mut BattlePhase, BattleError> {
        self.phases
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| BattleError::UnknownPhase(name.to_string()))
    }

    pub fn add_ability_or_merge(
        &mut self,
        phase: &str,
        player: PlayerId,
        ability: UnitAbility,
    ) -> Result<(), BattleError> {
        self.phase_mut(phase)?.add_ability_or_merge_attached(player, ability);
        Ok(())
    }

    pub fn add_conversion(&mut self, owner: PlayerId, conversion: ConvertUnitAbility) {
        if !self.conversions.iter().any(|(p, c)| *p == owner && *c == conversion) {
            self.conversions.push((owner, conversion));
        }
    }

    pub fn conversions(&self) -> &[(PlayerId, ConvertUnitAbility)] {
        &self.conversions
    }

    /// Schedules a registered step to run after a phase's fire steps.
    pub fn add_custom_step(&mut self, phase: &str, step: &str) -> Result<(), BattleError> {
        self.phase_mut(phase)?.custom_steps.push(step.to_string());
        Ok(())
    }

    /// Applies every conversion whose trigger units are present and returns
    /// the rewritten list. Conversions are applied in the order they were
    /// added; the result carries none.
    pub fn resolved(&self, view: &BattleState<'_>) -> Result<BattlePhaseList, BattleError> {
        let mut out = BattlePhaseList {
            phases: self.phases.clone(),
            conversions: Vec::new(),
        };
        for (owner, conversion) in &self.conversions {
            let Some(owner_side) = view.battle.side_of(*owner) else {
                continue;
            };
            let mut present = false;
            for id in view.filter_units(UnitFilter::Firing, owner_side)? {
                if conversion.attached.contains(&view.game.unit(id)?.unit_type) {
                    present = true;
                    break;
                }
            }
            if !present {
                continue;
            }
            let affected = match conversion.team {
                Team::Friendly => *owner,
                Team::Foe => view.player(owner_side.opposite()),
            };
            let moved = out
                .phase_mut(&conversion.from_phase)?
                .take_attached(affected, &conversion.from);
            if moved.is_empty() {
                continue;
            }
            debug!(conversion = %conversion.name, ?moved, "converting ability");
            if let Some(to) = &conversion.to {
                let mut to = to.clone();
                to.attached = moved;
                out.add_ability_or_merge(&conversion.to_phase, affected, to)?;
            }
        }
        Ok(out)
    }

    /// Unit types `side` fires with in `phase` this round. Empty when the
    /// phase does not exist.
    pub fn firing_types(&self, phase: &str, view: &BattleState<'_>, side: Side) -> BTreeSet<UnitTypeId> {
        let Some(phase) = self.phases.iter().find(|p| p.name == phase) else {
            return BTreeSet::new();
        };
        phase
            .abilities_for(view.player(side))
            .iter()
            .filter(|a| a.is_active(side, view.round()))
            .flat_map(|a| a.attached.iter().copied())
            .collect()
    }

    /// The phase-driven steps of one round, in phase order.
    pub fn battle_steps(&self, view: &BattleState<'_>) -> Result<Vec<BattleStep>, BattleError> {
        let mut steps = Vec::new();
        for phase in &self.phases {
            steps.extend(phase.steps_for(view)?);
        }
        Ok(steps)
    }
}
