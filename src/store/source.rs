//! Sources that fill an empty project cache, and sinks that publish it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{FieldDescriptor, ProjectSchema, Record};

/// Project source and sink errors.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Project {project_id} not found")]
    ProjectNotFound { project_id: String },
    #[error("Project {project_id} is not cached and no source is configured")]
    Offline { project_id: String },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid payload in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where project schemas and records come from when the cache is empty.
pub trait ProjectSource {
    /// Field descriptors of a project, in declared order.
    fn fetch_schema(&self, project_id: &str) -> Result<Vec<FieldDescriptor>, SourceError>;

    /// Every stored record of a project.
    fn fetch_records(&self, project_id: &str) -> Result<Vec<Record>, SourceError>;
}

/// Where a project's records are published.
pub trait ProjectSink {
    /// Publish `records` for a project, returning how many were written.
    fn put_records(
        &self,
        project_id: &str,
        schema: &ProjectSchema,
        records: &[Record],
    ) -> Result<usize, SourceError>;
}

/// Source used when only the cache is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl ProjectSource for OfflineSource {
    fn fetch_schema(&self, project_id: &str) -> Result<Vec<FieldDescriptor>, SourceError> {
        Err(SourceError::Offline {
            project_id: project_id.to_string(),
        })
    }

    fn fetch_records(&self, project_id: &str) -> Result<Vec<Record>, SourceError> {
        Err(SourceError::Offline {
            project_id: project_id.to_string(),
        })
    }
}

/// Project metadata payload: `{"metadata": [fields...]}`.
#[derive(Deserialize)]
struct ProjectPayload {
    metadata: Vec<FieldDescriptor>,
}

/// One stored model: `{"parameters": {...}}`.
#[derive(Deserialize)]
struct ModelPayload {
    parameters: Record,
}

/// Outgoing model payload, INT fields written as integers.
#[derive(Serialize)]
struct ModelUpload {
    parameters: Value,
}

/// Reads and writes exported project payloads in a directory.
///
/// ```text
/// {root}/project/{id}.json        {"metadata": [field descriptors]}
/// {root}/project/{id}/model.json  [{"parameters": {...}}, ...]
/// ```
#[derive(Debug, Clone)]
pub struct ExportDirSource {
    root: PathBuf,
}

impl ExportDirSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn project_path(&self, project_id: &str) -> PathBuf {
        self.root.join("project").join(format!("{}.json", project_id))
    }

    fn models_path(&self, project_id: &str) -> PathBuf {
        self.root.join("project").join(project_id).join("model.json")
    }

    fn require_project(&self, project_id: &str) -> Result<(), SourceError> {
        if self.project_path(project_id).exists() {
            Ok(())
        } else {
            Err(SourceError::ProjectNotFound {
                project_id: project_id.to_string(),
            })
        }
    }

    fn read<T: serde::de::DeserializeOwned>(
        &self,
        path: PathBuf,
        project_id: &str,
    ) -> Result<T, SourceError> {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::ProjectNotFound {
                    project_id: project_id.to_string(),
                });
            }
            Err(source) => return Err(SourceError::Io { path, source }),
        };
        serde_json::from_str(&content).map_err(|source| SourceError::Json { path, source })
    }
}

impl ProjectSource for ExportDirSource {
    fn fetch_schema(&self, project_id: &str) -> Result<Vec<FieldDescriptor>, SourceError> {
        let payload: ProjectPayload = self.read(self.project_path(project_id), project_id)?;
        Ok(payload.metadata)
    }

    fn fetch_records(&self, project_id: &str) -> Result<Vec<Record>, SourceError> {
        // A project without an export is missing; a project without models is empty.
        self.require_project(project_id)?;
        let path = self.models_path(project_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let models: Vec<ModelPayload> = self.read(path, project_id)?;
        Ok(models.into_iter().map(|m| m.parameters).collect())
    }
}

/// Replaces `model.json` with one payload per record.
impl ProjectSink for ExportDirSource {
    fn put_records(
        &self,
        project_id: &str,
        schema: &ProjectSchema,
        records: &[Record],
    ) -> Result<usize, SourceError> {
        self.require_project(project_id)?;

        let path = self.models_path(project_id);
        let models: Vec<ModelUpload> = records
            .iter()
            .map(|record| ModelUpload {
                parameters: schema.record_json(record),
            })
            .collect();
        let json = serde_json::to_string_pretty(&models).map_err(|source| SourceError::Json {
            path: path.clone(),
            source,
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SourceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, json).map_err(|source| SourceError::Io { path, source })?;
        Ok(models.len())
    }
}
