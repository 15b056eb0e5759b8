//! Store module - Local document cache, the sources that fill it and the
//! sinks it is published to.
//!
//! A project is cached as one JSON file holding separate tables for its
//! schema and its records. Records are only ever appended.

mod cache;
mod document;
mod source;

pub use cache::{
    AUTH_TOKEN_TABLE, CacheError, ProjectCache, RECORDS_TABLE, RecordPool, SCHEMA_TABLE,
};
pub use document::{DocumentStore, StoreError};
pub use source::{ExportDirSource, OfflineSource, ProjectSink, ProjectSource, SourceError};
