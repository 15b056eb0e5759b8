//! Morpho GA - Parametric genetic-algorithm child generation.
//!
//! This crate produces new candidate parameter records for a project from a
//! typed schema of numeric fields and a pool of previously evaluated records.
//! Each child comes from random generation, mutation, or crossover, is
//! truncated to its fields' precision, and is only kept when it fits the
//! schema and does not duplicate a parent.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: Field descriptors, records, fitness queries and search configuration
//! - `compute`: The child-generation engine (selection, breeding, precision, gating)
//! - `store`: Local JSON document cache and the project sources that fill it
//!
//! # Example
//!
//! ```rust,no_run
//! use morpho_ga::{
//!     compute::GaSearch,
//!     schema::{ChildRequest, FitnessQuery},
//!     store::{ExportDirSource, ProjectCache},
//! };
//!
//! // Open the project's cache, filling it from exported payloads on first use
//! let source = ExportDirSource::new("exports");
//! let mut cache = ProjectCache::open(".", "d1445161-1ac0-4f5c-b085-acf6164396e3")?;
//! let schema = cache.load_schema(&source)?;
//! cache.load_records(&source)?;
//!
//! // Breed from the records with step < 59, tallest first
//! let request = ChildRequest {
//!     query: "step<59".parse::<FitnessQuery>()?,
//!     sort_field: Some("height".to_string()),
//!     ascending: false,
//!     ..Default::default()
//! };
//! let mut search = GaSearch::with_seed(schema, cache, None);
//! match search.generate_child(&request)? {
//!     Some(child) => println!("New child: {:?}", child),
//!     None => println!("No child produced, check logs"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use compute::{GaSearch, GenomeRng, RandomSource};
pub use schema::{ChildRequest, FieldDescriptor, FitnessQuery, ProjectSchema, Record, SearchConfig};
pub use store::{ProjectCache, RecordPool};
