//! Random sources and per-field genetic operators.
//!
//! Provides random generation, step mutation, and crossover operations on
//! single field values. Whole-record strategies live in `strategy`.

use rand::prelude::*;

use crate::schema::{BaseType, FieldDescriptor};

/// Source of the random draws used during breeding.
///
/// Injected into every breeding call so runs can be replayed from a seed.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// Uniform integer in the closed interval `[lo, hi]`.
    fn int_inclusive(&mut self, lo: i64, hi: i64) -> i64;

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;

    /// `-1.0` or `+1.0` with equal odds.
    fn sign(&mut self) -> f64 {
        if self.index(2) == 0 { -1.0 } else { 1.0 }
    }

    /// Crossover coin: `true` breeds the gene, `false` selects it from a parent.
    fn coin(&mut self) -> bool {
        self.index(2) == 1
    }
}

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create from an optional seed, falling back to entropy.
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::random, Self::new)
    }
}

impl RandomSource for GenomeRng {
    fn uniform(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    fn int_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        self.rng.gen_range(lo..=hi)
    }

    fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Random value for a field.
///
/// Fractional fields sample `[min, max)`; integer fields sample the closed
/// interval `[floor(min), floor(max)]`.
pub fn random_value<R: RandomSource + ?Sized>(field: &FieldDescriptor, rng: &mut R) -> f64 {
    match field.base_type {
        BaseType::Float | BaseType::Double => {
            field.min() + rng.uniform() * (field.max() - field.min())
        }
        BaseType::Int => {
            let lo = field.min().floor() as i64;
            let hi = field.max().floor() as i64;
            rng.int_inclusive(lo, hi) as f64
        }
    }
}

/// Step mutation: move by one step in a random direction, then clamp.
pub fn step_mutate<R: RandomSource + ?Sized>(
    field: &FieldDescriptor,
    value: f64,
    rng: &mut R,
) -> f64 {
    field.clamp(value + rng.sign() * field.step)
}

/// Pick one of two parent values.
pub fn select_gene<R: RandomSource + ?Sized>(v1: f64, v2: f64, rng: &mut R) -> f64 {
    if rng.index(2) == 0 { v1 } else { v2 }
}

/// Interpolate between two parent values, then clamp.
///
/// Agreeing parents pass their shared value through without a draw.
pub fn breed_gene<R: RandomSource + ?Sized>(
    field: &FieldDescriptor,
    v1: f64,
    v2: f64,
    spread: f64,
    rng: &mut R,
) -> f64 {
    if v1 == v2 {
        return v1;
    }
    field.clamp(uniform_line(v1, v2, spread, rng.uniform()))
}

/// Point on the line through two values, extended by `spread` of their
/// distance on each side. `t` in `[0, 1)` maps to `[-spread, 1 + spread)`.
pub fn uniform_line(v1: f64, v2: f64, spread: f64, t: f64) -> f64 {
    let diff = (v1 - v2).abs();
    let mu = (1.0 + 2.0 * spread) * t - spread;
    v1.min(v2) + diff * mu
}

/// Test-only random source replaying scripted uniform draws.
#[cfg(test)]
pub(crate) struct ScriptedRng {
    draws: std::collections::VecDeque<f64>,
}

#[cfg(test)]
impl ScriptedRng {
    pub(crate) fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }

    /// Draws forcing `sign()` to `+1` for `n` calls.
    pub(crate) fn plus(n: usize) -> Self {
        Self::new(std::iter::repeat_n(0.75, n))
    }

    /// Draws forcing `sign()` to `-1` for `n` calls.
    pub(crate) fn minus(n: usize) -> Self {
        Self::new(std::iter::repeat_n(0.25, n))
    }

    pub(crate) fn remaining(&self) -> usize {
        self.draws.len()
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRng {
    fn uniform(&mut self) -> f64 {
        self.draws.pop_front().expect("scripted draws exhausted")
    }

    fn int_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        let span = (hi - lo + 1) as f64;
        lo + (self.uniform() * span).floor() as i64
    }

    fn index(&mut self, len: usize) -> usize {
        ((self.uniform() * len as f64).floor() as usize).min(len - 1)
    }
}
