//! Random sources.
//!
//! The engine never rolls dice itself; it asks a `RandomSource` for a batch
//! of values. In a networked game that source is shared and synchronized by
//! the host, so the order and shape of requests must be deterministic.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::DiceError;
use crate::board::PlayerId;

/// What a batch of dice is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiceCategory {
    Combat,
    Bombing,
    NonCombat,
}

/// Supplier of uniformly distributed dice faces.
pub trait RandomSource {
    /// Returns `count` values in `[0, sides)`.
    ///
    /// Called with `count == 0` it must return an empty vector without
    /// advancing any state.
    fn draw(
        &mut self,
        sides: u32,
        count: u32,
        player: PlayerId,
        category: DiceCategory,
        annotation: &str,
    ) -> Vec<u32>;
}

/// Draws a batch and checks the source honored its contract.
///
/// A zero count never reaches the source.
pub fn draw_checked(
    random: &mut dyn RandomSource,
    sides: u32,
    count: u32,
    player: PlayerId,
    category: DiceCategory,
    annotation: &str,
) -> Result<Vec<u32>, DiceError> {
    if sides == 0 {
        return Err(DiceError::ZeroSides);
    }
    if count == 0 {
        return Ok(Vec::new());
    }
    let values = random.draw(sides, count, player, category, annotation);
    if values.len() != count as usize {
        return Err(DiceError::WrongCount {
            expected: count,
            got: values.len(),
        });
    }
    if let Some(&value) = values.iter().find(|&&v| v >= sides) {
        return Err(DiceError::OutOfRange { value, sides });
    }
    Ok(values)
}

/// Reproducible source backed by ChaCha8, identical on every platform.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        SeededRandom {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn draw(&mut self, sides: u32, count: u32, _: PlayerId, _: DiceCategory, _: &str) -> Vec<u32> {
        (0..count).map(|_| self.rng.gen_range(0..sides)).collect()
    }
}

/// Source that hands out a fixed script of values, used for replaying
/// dice received from the host and for tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: Vec<u32>,
    next: usize,
    calls: usize,
}

impl ScriptedRandom {
    pub fn new(values: Vec<u32>) -> Self {
        ScriptedRandom {
            values,
            next: 0,
            calls: 0,
        }
    }

    /// Builds a script from recorded batches, in order.
    pub fn from_batches(batches: &[Vec<u32>]) -> Self {
        ScriptedRandom::new(batches.iter().flatten().copied().collect())
    }

    /// Number of times `draw` has been called.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Values not yet handed out.
    pub fn remaining(&self) -> usize {
        self.values.len() - self.next
    }
}

impl RandomSource for ScriptedRandom {
    /// Returns fewer than `count` values once the script runs out.
    fn draw(&mut self, _: u32, count: u32, _: PlayerId, _: DiceCategory, _: &str) -> Vec<u32> {
        self.calls += 1;
        let end = (self.next + count as usize).min(self.values.len());
        let out = self.values[self.next..end].to_vec();
        self.next = end;
        out
    }
}

/// Wraps a source and records every batch it produces, so the host can ship
/// the exact dice to peers.
#[derive(Debug, Clone)]
pub struct RecordingRandom<R> {
    inner: R,
    batches: Vec<Vec<u32>>,
}

impl<R: RandomSource> RecordingRandom<R> {
    pub fn new(inner: R) -> Self {
        RecordingRandom {
            inner,
            batches: Vec::new(),
        }
    }

    pub fn batches(&self) -> &[Vec<u32>] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<Vec<u32>> {
        self.batches
    }
}

impl<R: RandomSource> RandomSource for RecordingRandom<R> {
    fn draw(
        &mut self,
        sides: u32,
        count: u32,
        player: PlayerId,
        category: DiceCategory,
        annotation: &str,
    ) -> Vec<u32> {
        let values = self.inner.draw(sides, count, player, category, annotation);
        self.batches.push(values.clone());
        values
    }
}
