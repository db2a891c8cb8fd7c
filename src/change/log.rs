//! The mutation log.
//!
//! Records every performed change in order so the sequence can be
//! transmitted to peers verbatim and undone newest-first.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Change, ChangeError};
use crate::board::GameState;

/// Ordered record of performed changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLog {
    performed: Vec<Change>,
}

impl ChangeLog {
    pub fn new() -> Self {
        ChangeLog::default()
    }

    /// Performs a change and records it. Empty changes are skipped.
    pub fn perform(&mut self, state: &mut GameState, change: Change) -> Result<(), ChangeError> {
        if change.is_empty() {
            return Ok(());
        }
        change.perform(state)?;
        self.performed.push(change);
        Ok(())
    }

    /// Undoes the most recent change and returns it.
    pub fn undo_last(&mut self, state: &mut GameState) -> Result<Change, ChangeError> {
        let change = self.performed.pop().ok_or(ChangeError::NothingToUndo)?;
        debug!(remaining = self.performed.len(), "undoing change");
        if let Err(e) = change.invert().perform(state) {
            self.performed.push(change);
            return Err(e);
        }
        Ok(change)
    }

    /// Replays a log received from a peer onto a local copy of the state.
    pub fn replay(&mut self, state: &mut GameState, changes: &[Change]) -> Result<(), ChangeError> {
        for change in changes {
            self.perform(state, change.clone())?;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[Change] {
        &self.performed
    }

    pub fn len(&self) -> usize {
        self.performed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.performed.is_empty()
    }
}
