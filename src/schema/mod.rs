//! Schema module - Field, record, query and configuration types for GA searches.

mod field;
mod query;
mod record;
mod search;

pub use field::*;
pub use query::*;
pub use record::*;
pub use search::*;
