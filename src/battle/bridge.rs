use crate::board::GameState;
use crate::change::{Change, ChangeError, ChangeLog};
use crate::dice::RandomSource;
use crate::display::BattleDisplay;
use crate::history::HistorySink;

/// Everything a battle step may touch outside the battle itself: the
/// shared state and its mutation log, the random source, and the two
/// outbound channels.
pub struct Bridge<'a> {
    pub state: &'a mut GameState,
    pub log: &'a mut ChangeLog,
    pub random: &'a mut dyn RandomSource,
    pub history: &'a mut dyn HistorySink,
    pub display: &'a mut dyn BattleDisplay,
}

impl<'a> Bridge<'a> {
    /// Performs a change through the log.
    pub fn perform(&mut self, change: Change) -> Result<(), ChangeError> {
        self.log.perform(self.state, change)
    }
}
