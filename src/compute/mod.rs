//! Compute module - Breeding and selection for GA searches.

pub mod evolution;

pub use evolution::{GaSearch, GenomeRng, RandomSource};
