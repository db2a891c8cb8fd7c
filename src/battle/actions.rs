//! The collaborator that commits battle decisions.
//!
//! Steps decide who dies, submerges or retreats; a `BattleActions`
//! implementation turns those decisions into changes and answers the
//! questions a player would be asked.

use std::collections::BTreeSet;

use tracing::debug;

use super::bridge::Bridge;
use super::side::Side;
use super::state::BattleState;
use super::BattleError;
use crate::board::{GameState, SiteId, UnitId};
use crate::change::Change;

pub trait BattleActions {
    /// Removes units and their dependents from `site`.
    fn remove_units(
        &mut self,
        units: &[UnitId],
        bridge: &mut Bridge<'_>,
        site: SiteId,
        side: Side,
    ) -> Result<(), BattleError>;

    /// Takes units out of combat at `site`.
    fn submerge_units(
        &mut self,
        units: &[UnitId],
        side: Side,
        bridge: &mut Bridge<'_>,
        site: SiteId,
    ) -> Result<(), BattleError>;

    /// Moves units and their dependents from `from` to `to`.
    fn retreat_units(
        &mut self,
        units: &[UnitId],
        bridge: &mut Bridge<'_>,
        from: SiteId,
        to: SiteId,
    ) -> Result<(), BattleError>;

    /// Where `side` retreats to, if it retreats at all.
    fn query_retreat(&mut self, _view: &BattleState<'_>, _side: Side, _options: &[SiteId]) -> Option<SiteId> {
        None
    }

    /// Which of `candidates` submerge this round.
    fn query_submerge(&mut self, _view: &BattleState<'_>, _side: Side, _candidates: &[UnitId]) -> Vec<UnitId> {
        Vec::new()
    }

    /// Whether `side` wants to keep fighting.
    fn query_continue(&mut self, _view: &BattleState<'_>, _side: Side) -> bool {
        true
    }
}

/// Units plus their dependents that are alive at `site`, without duplicates.
fn with_dependents(state: &GameState, units: &[UnitId], site: SiteId) -> Result<Vec<UnitId>, BattleError> {
    let present = &state.site(site)?.units;
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for id in units.iter().copied().chain(state.dependents(units)) {
        if seen.insert(id) && present.contains(&id) && state.unit(id)?.alive {
            out.push(id);
        }
    }
    Ok(out)
}

/// Commits decisions as plain changes and never retreats or submerges on
/// its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardActions;

impl BattleActions for StandardActions {
    fn remove_units(
        &mut self,
        units: &[UnitId],
        bridge: &mut Bridge<'_>,
        site: SiteId,
        side: Side,
    ) -> Result<(), BattleError> {
        let doomed = with_dependents(bridge.state, units, site)?;
        if doomed.is_empty() {
            return Ok(());
        }
        debug!(%side, count = doomed.len(), "committing removal");
        bridge.perform(Change::remove_units(site, &doomed)?)?;
        Ok(())
    }

    fn submerge_units(
        &mut self,
        units: &[UnitId],
        side: Side,
        bridge: &mut Bridge<'_>,
        site: SiteId,
    ) -> Result<(), BattleError> {
        if units.is_empty() {
            return Ok(());
        }
        debug!(%side, count = units.len(), "committing submerge");
        let change = Change::submerge(bridge.state, units, true, BTreeSet::from([site]))?;
        bridge.perform(change)?;
        Ok(())
    }

    fn retreat_units(
        &mut self,
        units: &[UnitId],
        bridge: &mut Bridge<'_>,
        from: SiteId,
        to: SiteId,
    ) -> Result<(), BattleError> {
        let moving = with_dependents(bridge.state, units, from)?;
        if moving.is_empty() {
            return Ok(());
        }
        bridge.perform(Change::move_units(from, to, &moving)?)?;
        Ok(())
    }
}
