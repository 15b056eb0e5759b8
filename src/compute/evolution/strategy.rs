//! Breeding strategies.
//!
//! The strategy for a call is picked from the effective parent count alone:
//! no parents generates a fresh record, one parent is mutated, two or more
//! are crossed over.

use std::fmt;

use crate::schema::{DEFAULT_SPREAD, FieldDescriptor, ProjectSchema, Record};

use super::genome::{RandomSource, breed_gene, random_value, select_gene, step_mutate};
use super::precision::limit_field;

/// Errors raised while building a child record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("Strategy needs at least one parent but the pool is empty")]
    MissingParent,
    #[error("Parent record has no value for field {field}")]
    MissingField { field: String },
    #[error("Field {field} produced a non-finite value")]
    NonFiniteValue { field: String },
    #[error("Field {field}: cannot limit {value} to {precision} significant digits")]
    Precision {
        field: String,
        value: f64,
        precision: u32,
    },
}

/// A way of producing one child record from a parent set.
pub trait BreedStrategy {
    fn breed(
        &self,
        schema: &ProjectSchema,
        parents: &[Record],
        rng: &mut dyn RandomSource,
    ) -> Result<Record, GenerationError>;
}

/// Independent uniform sampling of every field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RandomGeneration;

/// Every field of the first parent moves one step up or down.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mutation;

/// Per-field selection or interpolation between two drawn parents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossover {
    /// How far past the parents' span interpolation may reach, as a fraction
    /// of their distance.
    pub spread: f64,
}

impl Default for Crossover {
    fn default() -> Self {
        Self {
            spread: DEFAULT_SPREAD,
        }
    }
}

/// Breeding strategy selected by parent count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Generate(RandomGeneration),
    Mutate(Mutation),
    Crossover(Crossover),
}

impl Strategy {
    /// Pick the strategy for an effective parent count.
    pub fn for_parent_count(count: usize, spread: f64) -> Self {
        match count {
            0 => Strategy::Generate(RandomGeneration),
            1 => Strategy::Mutate(Mutation),
            _ => Strategy::Crossover(Crossover { spread }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Generate(_) => write!(f, "random generation"),
            Strategy::Mutate(_) => write!(f, "mutation"),
            Strategy::Crossover(_) => write!(f, "crossover"),
        }
    }
}

impl BreedStrategy for Strategy {
    fn breed(
        &self,
        schema: &ProjectSchema,
        parents: &[Record],
        rng: &mut dyn RandomSource,
    ) -> Result<Record, GenerationError> {
        match self {
            Strategy::Generate(s) => s.breed(schema, parents, rng),
            Strategy::Mutate(s) => s.breed(schema, parents, rng),
            Strategy::Crossover(s) => s.breed(schema, parents, rng),
        }
    }
}

impl BreedStrategy for RandomGeneration {
    fn breed(
        &self,
        schema: &ProjectSchema,
        _parents: &[Record],
        rng: &mut dyn RandomSource,
    ) -> Result<Record, GenerationError> {
        build_record(schema, |field| Ok(random_value(field, rng)))
    }
}

impl BreedStrategy for Mutation {
    fn breed(
        &self,
        schema: &ProjectSchema,
        parents: &[Record],
        rng: &mut dyn RandomSource,
    ) -> Result<Record, GenerationError> {
        let parent = parents.first().ok_or(GenerationError::MissingParent)?;
        build_record(schema, |field| {
            let value = gene(parent, field)?;
            Ok(step_mutate(field, value, rng))
        })
    }
}

impl BreedStrategy for Crossover {
    fn breed(
        &self,
        schema: &ProjectSchema,
        parents: &[Record],
        rng: &mut dyn RandomSource,
    ) -> Result<Record, GenerationError> {
        if parents.is_empty() {
            return Err(GenerationError::MissingParent);
        }

        // Drawn with replacement: both slots may hold the same record.
        let parent1 = &parents[rng.index(parents.len())];
        let parent2 = &parents[rng.index(parents.len())];

        build_record(schema, |field| {
            let v1 = gene(parent1, field)?;
            let v2 = gene(parent2, field)?;
            if rng.coin() {
                Ok(breed_gene(field, v1, v2, self.spread, rng))
            } else {
                Ok(select_gene(v1, v2, rng))
            }
        })
    }
}

fn gene(parent: &Record, field: &FieldDescriptor) -> Result<f64, GenerationError> {
    parent
        .get(&field.name)
        .ok_or_else(|| GenerationError::MissingField {
            field: field.name.clone(),
        })
}

/// Produce each field in declared order and limit it to its precision
/// as soon as it is produced.
fn build_record<F>(schema: &ProjectSchema, mut produce: F) -> Result<Record, GenerationError>
where
    F: FnMut(&FieldDescriptor) -> Result<f64, GenerationError>,
{
    let mut record = Record::new();
    for field in schema.fields() {
        let value = produce(field)?;
        if !value.is_finite() {
            return Err(GenerationError::NonFiniteValue {
                field: field.name.clone(),
            });
        }
        record.insert(field.name.clone(), limit_field(&field.name, field.precision, value)?);
    }
    Ok(record)
}
