//! Invertible mutations of shared game state.
//!
//! A `Change` is plain data: it captures both the values it writes and the
//! values it replaces at construction time, so it can be shipped to a remote
//! peer, performed there, and undone by performing `invert()`. Nothing in the
//! engine writes to unit or site state except through `Change::perform`.

pub mod log;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::board::{BoardError, GameState, SiteId, UnitId};

pub use log::ChangeLog;

/// Errors raised while building or performing a change.
///
/// These are consistency violations; a log that raised one cannot be
/// trusted and callers are expected to abort.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChangeError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("unit {0} listed twice in one change")]
    DuplicateUnit(UnitId),

    #[error("unit {unit} expected {field} {expected}, found {found}")]
    StaleValue {
        unit: UnitId,
        field: &'static str,
        expected: u32,
        found: u32,
    },

    #[error("unit {unit} expected submerged={expected}")]
    StaleFlag { unit: UnitId, expected: bool },

    #[error("unit {unit} is not present at site {site}")]
    NotAtSite { unit: UnitId, site: SiteId },

    #[error("unit {unit} is already present at site {site}")]
    AlreadyAtSite { unit: UnitId, site: SiteId },

    #[error("unit {0} is already dead")]
    AlreadyDead(UnitId),

    #[error("nothing to undo")]
    NothingToUndo,
}

/// A per-unit integer assignment holding both the written and replaced value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitValue {
    pub unit: UnitId,
    pub new: u32,
    pub old: u32,
}

/// A per-unit flag assignment holding both the written and replaced value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFlag {
    pub unit: UnitId,
    pub new: bool,
    pub old: bool,
}

/// An invertible, serializable edit of shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    /// Sets accumulated hit counts.
    UnitHits {
        values: Vec<UnitValue>,
        sites: BTreeSet<SiteId>,
    },
    /// Sets damage levels.
    UnitDamage {
        values: Vec<UnitValue>,
        sites: BTreeSet<SiteId>,
    },
    /// Takes units out of a site and marks them dead.
    RemoveUnits { site: SiteId, units: Vec<UnitId> },
    /// Puts units into a site and marks them alive.
    AddUnits { site: SiteId, units: Vec<UnitId> },
    /// Moves units between sites.
    MoveUnits {
        from: SiteId,
        to: SiteId,
        units: Vec<UnitId>,
    },
    /// Sets submerged flags.
    Submerge {
        flags: Vec<UnitFlag>,
        sites: BTreeSet<SiteId>,
    },
    /// Performs its children in order.
    Composite(Vec<Change>),
}

fn check_unique(units: impl Iterator<Item = UnitId>) -> Result<(), ChangeError> {
    let mut seen = BTreeSet::new();
    for unit in units {
        if !seen.insert(unit) {
            return Err(ChangeError::DuplicateUnit(unit));
        }
    }
    Ok(())
}

impl Change {
    /// Builds a hits assignment, capturing each unit's current hits as the old value.
    pub fn unit_hits(
        state: &GameState,
        new_hits: &[(UnitId, u32)],
        sites: BTreeSet<SiteId>,
    ) -> Result<Change, ChangeError> {
        check_unique(new_hits.iter().map(|(u, _)| *u))?;
        let values = new_hits
            .iter()
            .map(|&(unit, new)| {
                Ok(UnitValue {
                    unit,
                    new,
                    old: state.unit(unit)?.hits,
                })
            })
            .collect::<Result<Vec<_>, ChangeError>>()?;
        Ok(Change::UnitHits { values, sites })
    }

    /// Builds a damage assignment, capturing each unit's current damage as the old value.
    pub fn unit_damage(
        state: &GameState,
        new_damage: &[(UnitId, u32)],
        sites: BTreeSet<SiteId>,
    ) -> Result<Change, ChangeError> {
        check_unique(new_damage.iter().map(|(u, _)| *u))?;
        let values = new_damage
            .iter()
            .map(|&(unit, new)| {
                Ok(UnitValue {
                    unit,
                    new,
                    old: state.unit(unit)?.damage,
                })
            })
            .collect::<Result<Vec<_>, ChangeError>>()?;
        Ok(Change::UnitDamage { values, sites })
    }

    /// Returns a change that takes `units` off `site`.
    pub fn remove_units(site: SiteId, units: &[UnitId]) -> Result<Change, ChangeError> {
        check_unique(units.iter().copied())?;
        Ok(Change::RemoveUnits {
            site,
            units: units.to_vec(),
        })
    }

    /// Returns a change that puts `units` on `site`.
    pub fn add_units(site: SiteId, units: &[UnitId]) -> Result<Change, ChangeError> {
        check_unique(units.iter().copied())?;
        Ok(Change::AddUnits {
            site,
            units: units.to_vec(),
        })
    }

    /// Returns a change that moves `units` from one site to another.
    pub fn move_units(from: SiteId, to: SiteId, units: &[UnitId]) -> Result<Change, ChangeError> {
        check_unique(units.iter().copied())?;
        Ok(Change::MoveUnits {
            from,
            to,
            units: units.to_vec(),
        })
    }

    /// Builds a submerge assignment for `units`, capturing their current flags.
    pub fn submerge(
        state: &GameState,
        units: &[UnitId],
        submerged: bool,
        sites: BTreeSet<SiteId>,
    ) -> Result<Change, ChangeError> {
        check_unique(units.iter().copied())?;
        let flags = units
            .iter()
            .map(|&unit| {
                Ok(UnitFlag {
                    unit,
                    new: submerged,
                    old: state.unit(unit)?.submerged,
                })
            })
            .collect::<Result<Vec<_>, ChangeError>>()?;
        Ok(Change::Submerge { flags, sites })
    }

    /// Returns true if performing this change would not touch anything.
    pub fn is_empty(&self) -> bool {
        match self {
            Change::UnitHits { values, .. } | Change::UnitDamage { values, .. } => values.is_empty(),
            Change::RemoveUnits { units, .. }
            | Change::AddUnits { units, .. }
            | Change::MoveUnits { units, .. } => units.is_empty(),
            Change::Submerge { flags, .. } => flags.is_empty(),
            Change::Composite(children) => children.iter().all(Change::is_empty),
        }
    }

    /// Every site this change notifies when performed.
    pub fn sites(&self) -> BTreeSet<SiteId> {
        match self {
            Change::UnitHits { sites, .. }
            | Change::UnitDamage { sites, .. }
            | Change::Submerge { sites, .. } => sites.clone(),
            Change::RemoveUnits { site, .. } | Change::AddUnits { site, .. } => {
                BTreeSet::from([*site])
            }
            Change::MoveUnits { from, to, .. } => BTreeSet::from([*from, *to]),
            Change::Composite(children) => children.iter().flat_map(Change::sites).collect(),
        }
    }

    /// Returns the change that undoes this one.
    pub fn invert(&self) -> Change {
        fn swap(values: &[UnitValue]) -> Vec<UnitValue> {
            values
                .iter()
                .map(|v| UnitValue {
                    unit: v.unit,
                    new: v.old,
                    old: v.new,
                })
                .collect()
        }

        match self {
            Change::UnitHits { values, sites } => Change::UnitHits {
                values: swap(values),
                sites: sites.clone(),
            },
            Change::UnitDamage { values, sites } => Change::UnitDamage {
                values: swap(values),
                sites: sites.clone(),
            },
            Change::RemoveUnits { site, units } => Change::AddUnits {
                site: *site,
                units: units.clone(),
            },
            Change::AddUnits { site, units } => Change::RemoveUnits {
                site: *site,
                units: units.clone(),
            },
            Change::MoveUnits { from, to, units } => Change::MoveUnits {
                from: *to,
                to: *from,
                units: units.clone(),
            },
            Change::Submerge { flags, sites } => Change::Submerge {
                flags: flags
                    .iter()
                    .map(|f| UnitFlag {
                        unit: f.unit,
                        new: f.old,
                        old: f.new,
                    })
                    .collect(),
                sites: sites.clone(),
            },
            Change::Composite(children) => {
                Change::Composite(children.iter().rev().map(Change::invert).collect())
            }
        }
    }

    /// Applies the change and notifies every affected site.
    ///
    /// Each leaf change validates all of its recorded old values before
    /// writing anything. A composite is not rolled back if a later child
    /// fails.
    pub fn perform(&self, state: &mut GameState) -> Result<(), ChangeError> {
        trace!(change = ?self, "performing change");
        match self {
            Change::UnitHits { values, .. } => {
                for v in values {
                    let found = state.unit(v.unit)?.hits;
                    if found != v.old {
                        return Err(ChangeError::StaleValue {
                            unit: v.unit,
                            field: "hits",
                            expected: v.old,
                            found,
                        });
                    }
                }
                for v in values {
                    state.unit_mut(v.unit)?.hits = v.new;
                }
            }
            Change::UnitDamage { values, .. } => {
                for v in values {
                    let found = state.unit(v.unit)?.damage;
                    if found != v.old {
                        return Err(ChangeError::StaleValue {
                            unit: v.unit,
                            field: "damage",
                            expected: v.old,
                            found,
                        });
                    }
                }
                for v in values {
                    state.unit_mut(v.unit)?.damage = v.new;
                }
            }
            Change::RemoveUnits { site, units } => {
                for &unit in units {
                    if !state.site(*site)?.units.contains(&unit) {
                        return Err(ChangeError::NotAtSite { unit, site: *site });
                    }
                    if !state.unit(unit)?.alive {
                        return Err(ChangeError::AlreadyDead(unit));
                    }
                }
                for &unit in units {
                    state.site_mut(*site)?.units.remove(&unit);
                    state.unit_mut(unit)?.alive = false;
                }
            }
            Change::AddUnits { site, units } => {
                for &unit in units {
                    state.unit(unit)?;
                    if state.site(*site)?.units.contains(&unit) {
                        return Err(ChangeError::AlreadyAtSite { unit, site: *site });
                    }
                }
                for &unit in units {
                    state.site_mut(*site)?.units.insert(unit);
                    state.unit_mut(unit)?.alive = true;
                }
            }
            Change::MoveUnits { from, to, units } => {
                for &unit in units {
                    if !state.site(*from)?.units.contains(&unit) {
                        return Err(ChangeError::NotAtSite { unit, site: *from });
                    }
                    if state.site(*to)?.units.contains(&unit) {
                        return Err(ChangeError::AlreadyAtSite { unit, site: *to });
                    }
                }
                for &unit in units {
                    state.site_mut(*from)?.units.remove(&unit);
                    state.site_mut(*to)?.units.insert(unit);
                }
            }
            Change::Submerge { flags, .. } => {
                for f in flags {
                    if state.unit(f.unit)?.submerged != f.old {
                        return Err(ChangeError::StaleFlag {
                            unit: f.unit,
                            expected: f.old,
                        });
                    }
                }
                for f in flags {
                    state.unit_mut(f.unit)?.submerged = f.new;
                }
            }
            Change::Composite(children) => {
                for child in children {
                    child.perform(state)?;
                }
                return Ok(());
            }
        }
        for site in self.sites() {
            state.notify_site(site)?;
        }
        Ok(())
    }
}
