//! Display broadcaster.
//!
//! The engine announces doomed units here before the removal is committed,
//! once per side per removal batch.

use crate::battle::{BattleId, Outcome};
use crate::board::{PlayerId, UnitId};

/// Receiver of battle notifications.
pub trait BattleDisplay {
    fn notify_units_removed(
        &mut self,
        battle: BattleId,
        player: PlayerId,
        units: &[UnitId],
        dependents: &[UnitId],
    );

    fn notify_battle_ended(&mut self, _battle: BattleId, _outcome: Outcome) {}
}

/// Ignores all notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl BattleDisplay for NullDisplay {
    fn notify_units_removed(&mut self, _: BattleId, _: PlayerId, _: &[UnitId], _: &[UnitId]) {}
}

/// One removal notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub battle: BattleId,
    pub player: PlayerId,
    pub units: Vec<UnitId>,
    pub dependents: Vec<UnitId>,
}

/// Records notifications for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    pub removals: Vec<Removal>,
    pub endings: Vec<(BattleId, Outcome)>,
}

impl BattleDisplay for RecordingDisplay {
    fn notify_units_removed(
        &mut self,
        battle: BattleId,
        player: PlayerId,
        units: &[UnitId],
        dependents: &[UnitId],
    ) {
        self.removals.push(Removal {
            battle,
            player,
            units: units.to_vec(),
            dependents: dependents.to_vec(),
        });
    }

    fn notify_battle_ended(&mut self, battle: BattleId, outcome: Outcome) {
        self.endings.push((battle, outcome));
    }
}
