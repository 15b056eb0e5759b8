//! Single-file JSON document store with named tables.
//!
//! Layout on disk:
//!
//! ```text
//! {
//!   "schema":  { "1": { "schema": [ ...field descriptors... ] } },
//!   "records": { "1": { "step": 4, "height": 1.5 }, "2": { ... } }
//! }
//! ```
//!
//! Every write rewrites the whole file.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

type Table = BTreeMap<u64, Value>;

/// Document store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Store file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Document {id} in table {table} is malformed: {source}")]
    Malformed {
        table: String,
        id: u64,
        #[source]
        source: serde_json::Error,
    },
    #[error("Could not serialize document for table {table}: {source}")]
    Serialize {
        table: String,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON document store backed by one file.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    tables: BTreeMap<String, Table>,
}

impl DocumentStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let tables = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        log::debug!("Opened document store {}", path.display());
        Ok(Self { path, tables })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All documents of a table in insertion order.
    pub fn all(&self, table: &str) -> Vec<&Value> {
        self.tables
            .get(table)
            .map(|t| t.values().collect())
            .unwrap_or_default()
    }

    /// Documents of a table matching `predicate`.
    pub fn search<P>(&self, table: &str, predicate: P) -> Vec<&Value>
    where
        P: Fn(&Value) -> bool,
    {
        self.all(table).into_iter().filter(|v| predicate(v)).collect()
    }

    /// Number of documents in a table.
    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Insert one document, returning its id.
    ///
    /// Nothing is kept in memory if the file cannot be written.
    pub fn insert(&mut self, table: &str, document: Value) -> Result<u64, StoreError> {
        let id = self.push(table, document);
        if let Err(e) = self.flush() {
            self.rollback(table, &[id]);
            return Err(e);
        }
        Ok(id)
    }

    /// Insert many documents with a single flush, returning their ids.
    pub fn insert_multiple<I>(&mut self, table: &str, documents: I) -> Result<Vec<u64>, StoreError>
    where
        I: IntoIterator<Item = Value>,
    {
        let ids: Vec<u64> = documents
            .into_iter()
            .map(|doc| self.push(table, doc))
            .collect();
        if let Err(e) = self.flush() {
            self.rollback(table, &ids);
            return Err(e);
        }
        Ok(ids)
    }

    /// Deserialize every document of a table.
    pub fn typed<T: serde::de::DeserializeOwned>(&self, table: &str) -> Result<Vec<T>, StoreError> {
        let Some(docs) = self.tables.get(table) else {
            return Ok(Vec::new());
        };
        docs.iter()
            .map(|(&id, doc)| {
                T::deserialize(doc).map_err(|source| StoreError::Malformed {
                    table: table.to_string(),
                    id,
                    source,
                })
            })
            .collect()
    }

    fn push(&mut self, table: &str, document: Value) -> u64 {
        let docs = self.tables.entry(table.to_string()).or_default();
        let id = docs.keys().next_back().map_or(1, |last| last + 1);
        docs.insert(id, document);
        id
    }

    fn rollback(&mut self, table: &str, ids: &[u64]) {
        if let Some(docs) = self.tables.get_mut(table) {
            for id in ids {
                docs.remove(id);
            }
            if docs.is_empty() {
                self.tables.remove(table);
            }
        }
    }

    fn flush(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.tables).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
