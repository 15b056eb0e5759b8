//! Child-generation engine for parametric GA searches.
//!
//! # Overview
//!
//! One call to [`GaSearch::generate_child`] runs:
//!
//! - **Selection** (`selection`): filter the record pool with a fitness
//!   predicate, optionally sort by a field and keep the leading `limit` records
//! - **Breeding** (`strategy`, `genome`): pick a strategy from the parent count
//!   and build a candidate field by field
//! - **Precision** (`precision`): truncate each produced value to its field's
//!   significant digits
//! - **Gate** (`gate`): reject duplicates of a parent and schema violations
//! - **Persistence**: append the accepted child to the pool
//!
//! # Example
//!
//! ```rust,no_run
//! use morpho_ga::compute::evolution::GaSearch;
//! use morpho_ga::schema::{BaseType, ChildRequest, FieldDescriptor, ProjectSchema, Record};
//!
//! let schema = ProjectSchema::new(vec![
//!     FieldDescriptor::new("step", BaseType::Int, (1.0, 100.0), 1.0),
//!     FieldDescriptor::new("height", BaseType::Float, (0.5, 3.0), 0.25).with_precision(3),
//! ])?;
//! let pool: Vec<Record> = Vec::new();
//!
//! let mut search = GaSearch::with_seed(schema, pool, Some(42));
//! if let Some(child) = search.generate_child(&ChildRequest::default())? {
//!     println!("{}", serde_json::to_string(&child)?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Strategies
//!
//! - `RandomGeneration`: no parents, every field sampled uniformly
//! - `Mutation`: one parent, every field moved one step up or down
//! - `Crossover`: two or more parents, each field selected from or
//!   interpolated between two randomly drawn parents

mod gate;
mod genome;
mod precision;
mod search;
mod selection;
mod strategy;

pub use gate::{Rejection, accept};
pub use genome::{
    GenomeRng, RandomSource, breed_gene, random_value, select_gene, step_mutate, uniform_line,
};
pub use precision::{normalize, truncate_to_precision};
pub use search::{GaSearch, SearchError, breed_child};
pub use selection::{SelectionError, select_for_request, select_parents, sort_pool};
pub use strategy::{
    BreedStrategy, Crossover, GenerationError, Mutation, RandomGeneration, Strategy,
};
