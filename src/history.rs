//! History sinks.
//!
//! Every roll and every casualty is reported as a line of text plus a
//! structured payload. Sinks are fire-and-forget and never fail.

use serde::Serialize;
use tracing::info;

use crate::board::{BoardError, GameState, UnitId};
use crate::change::Change;
use crate::dice::DiceRoll;

/// Structured data attached to a history event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HistoryPayload {
    None,
    Dice(DiceRoll),
    Units(Vec<UnitId>),
    Change(Change),
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEvent {
    pub text: String,
    pub payload: HistoryPayload,
}

/// Receiver of history events.
pub trait HistorySink {
    fn record_event(&mut self, text: &str, payload: HistoryPayload);
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    pub events: Vec<HistoryEvent>,
}

impl MemoryHistory {
    /// Texts of all recorded events, oldest first.
    pub fn texts(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.text.as_str()).collect()
    }
}

impl HistorySink for MemoryHistory {
    fn record_event(&mut self, text: &str, payload: HistoryPayload) {
        self.events.push(HistoryEvent {
            text: text.to_string(),
            payload,
        });
    }
}

/// Forwards event text to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHistory;

impl HistorySink for TracingHistory {
    fn record_event(&mut self, text: &str, _: HistoryPayload) {
        info!(target: "fireline::history", "{text}");
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHistory;

impl HistorySink for NullHistory {
    fn record_event(&mut self, _: &str, _: HistoryPayload) {}
}

/// Summarizes units by type in order of first appearance, e.g.
/// `2 infantry, 1 tank`.
pub fn describe_units(state: &GameState, units: &[UnitId]) -> Result<String, BoardError> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for &unit in units {
        let name = state.type_of(unit)?.name.as_str();
        match counts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }
    if counts.is_empty() {
        return Ok("nothing".to_string());
    }
    Ok(counts
        .iter()
        .map(|(name, count)| format!("{count} {name}"))
        .collect::<Vec<_>>()
        .join(", "))
}
