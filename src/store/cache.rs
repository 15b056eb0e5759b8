//! Project cache: schema and record tables of a document store.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::schema::{FieldDescriptor, ProjectSchema, Record};

use super::document::{DocumentStore, StoreError};
use super::source::{ProjectSink, ProjectSource, SourceError};

/// Table holding the cached schema document.
pub const SCHEMA_TABLE: &str = "schema";
/// Table holding one document per record.
pub const RECORDS_TABLE: &str = "records";
/// Table reserved for the upload token.
pub const AUTH_TOKEN_TABLE: &str = "auth_token";

/// Queryable, append-only pool of records.
pub trait RecordPool {
    /// Every record in the pool.
    fn all_records(&self) -> Result<Vec<Record>, StoreError>;

    /// Records matching `predicate`.
    fn search(&self, predicate: &dyn Fn(&Record) -> bool) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .all_records()?
            .into_iter()
            .filter(|r| predicate(r))
            .collect())
    }

    /// Append one record.
    fn insert_record(&mut self, record: &Record) -> Result<(), StoreError>;

    /// Append several records.
    fn insert_records(&mut self, records: &[Record]) -> Result<(), StoreError> {
        for record in records {
            self.insert_record(record)?;
        }
        Ok(())
    }
}

impl RecordPool for Vec<Record> {
    fn all_records(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.clone())
    }

    fn insert_record(&mut self, record: &Record) -> Result<(), StoreError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Errors loading a project into the cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Cached schema is invalid: {0}")]
    Schema(#[from] crate::schema::SchemaError),
}

#[derive(Serialize, Deserialize)]
struct SchemaDocument {
    schema: Vec<FieldDescriptor>,
}

/// A project's local document cache.
///
/// Once a schema is loaded or cached, records are stored with integral INT
/// values as JSON integers.
#[derive(Debug)]
pub struct ProjectCache {
    project_id: String,
    store: DocumentStore,
    schema: Option<ProjectSchema>,
}

impl ProjectCache {
    /// Open `{dir}/{project_id}.json`.
    pub fn open<P: AsRef<Path>>(dir: P, project_id: &str) -> Result<Self, StoreError> {
        let path = dir.as_ref().join(format!("{}.json", project_id));
        Ok(Self {
            project_id: project_id.to_string(),
            store: DocumentStore::open(path)?,
            schema: None,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// The cached schema, if one has been stored.
    pub fn cached_schema(&self) -> Result<Option<ProjectSchema>, CacheError> {
        let docs = self.store.typed::<SchemaDocument>(SCHEMA_TABLE)?;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(ProjectSchema::new(doc.schema)?)),
            None => Ok(None),
        }
    }

    /// Store a schema document.
    pub fn cache_schema(&mut self, schema: &ProjectSchema) -> Result<(), StoreError> {
        let doc = SchemaDocument {
            schema: schema.fields().to_vec(),
        };
        let value = serde_json::to_value(&doc).map_err(|source| StoreError::Serialize {
            table: SCHEMA_TABLE.to_string(),
            source,
        })?;
        self.store.insert(SCHEMA_TABLE, value)?;
        self.schema = Some(schema.clone());
        Ok(())
    }

    /// Return the cached schema, fetching and caching it on a miss.
    pub fn load_schema(&mut self, source: &dyn ProjectSource) -> Result<ProjectSchema, CacheError> {
        if let Some(schema) = self.cached_schema()? {
            log::debug!("Schema for project {} loaded from cache", self.project_id);
            self.schema = Some(schema.clone());
            return Ok(schema);
        }

        log::info!("Fetching schema for project {}", self.project_id);
        let schema = ProjectSchema::new(source.fetch_schema(&self.project_id)?)?;
        self.cache_schema(&schema)?;
        Ok(schema)
    }

    /// Fill an empty record table from `source`. A populated table is left alone.
    pub fn load_records(&mut self, source: &dyn ProjectSource) -> Result<usize, CacheError> {
        if !self.store.is_empty(RECORDS_TABLE) {
            log::debug!(
                "Records for project {} loaded from cache ({})",
                self.project_id,
                self.store.len(RECORDS_TABLE)
            );
            return Ok(0);
        }

        let records = source.fetch_records(&self.project_id)?;
        log::info!(
            "Fetched {} records for project {}",
            records.len(),
            self.project_id
        );
        self.insert_records(&records)?;
        Ok(records.len())
    }

    /// Publish every cached record that fits `schema` to `sink`.
    ///
    /// Records failing validation are logged and left out. Returns the number
    /// of records written.
    pub fn put_records(
        &self,
        schema: &ProjectSchema,
        sink: &dyn ProjectSink,
    ) -> Result<usize, CacheError> {
        let valid: Vec<Record> = self
            .all_records()?
            .into_iter()
            .filter(|record| match schema.validate_record(record) {
                Ok(()) => true,
                Err(violations) => {
                    let reasons: Vec<String> = violations.iter().map(ToString::to_string).collect();
                    log::error!("Not putting record {:?}: {}", record, reasons.join("; "));
                    false
                }
            })
            .collect();

        let written = sink.put_records(&self.project_id, schema, &valid)?;
        log::info!("Put {} records for project {}", written, self.project_id);
        Ok(written)
    }

    fn record_value(&self, record: &Record) -> Result<serde_json::Value, StoreError> {
        match &self.schema {
            Some(schema) => Ok(schema.record_json(record)),
            None => serde_json::to_value(record).map_err(|source| StoreError::Serialize {
                table: RECORDS_TABLE.to_string(),
                source,
            }),
        }
    }
}

impl RecordPool for ProjectCache {
    fn all_records(&self) -> Result<Vec<Record>, StoreError> {
        self.store.typed(RECORDS_TABLE)
    }

    fn insert_record(&mut self, record: &Record) -> Result<(), StoreError> {
        let value = self.record_value(record)?;
        self.store.insert(RECORDS_TABLE, value)?;
        Ok(())
    }

    fn insert_records(&mut self, records: &[Record]) -> Result<(), StoreError> {
        let values = records
            .iter()
            .map(|record| self.record_value(record))
            .collect::<Result<Vec<_>, _>>()?;
        self.store.insert_multiple(RECORDS_TABLE, values)?;
        Ok(())
    }
}
