// Copyright 2026 Hypermesh Foundation. All rights reserved.
// GridSim Power Grid Simulation - Random Draw Sources

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform draws in `[0, 1)` consumed by the drift phase.
///
/// The engine never reaches for ambient randomness; every draw goes through
/// one of these so a run can be replayed exactly.
pub trait DrawSource {
    fn next_unit(&mut self) -> f64;
}

impl DrawSource for ChaCha8Rng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl<D: DrawSource + ?Sized> DrawSource for &mut D {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

impl<D: DrawSource + ?Sized> DrawSource for Box<D> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Seeded ChaCha8 generator, the default source for controllers.
pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

// ─── ScriptedDraws ───────────────────────────────────────────────────────────

/// Replays a fixed sequence of draws, cycling when exhausted.
///
/// An empty script yields the neutral draw `0.45`, which produces zero drift.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedDraws {
    values: Vec<f64>,
    cursor: usize,
}

/// Draw value for which the drift phase moves load by exactly zero.
pub const NEUTRAL_DRAW: f64 = crate::engine::DRIFT_BIAS;

impl ScriptedDraws {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Every draw is neutral.
    pub fn neutral() -> Self {
        Self::new(vec![NEUTRAL_DRAW])
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl DrawSource for ScriptedDraws {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            self.cursor += 1;
            return NEUTRAL_DRAW;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}
