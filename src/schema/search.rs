//! Search session configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::FitnessQuery;

/// Default spread constant for crossover interpolation.
pub const DEFAULT_SPREAD: f64 = 0.5;

/// Top-level configuration for a search session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Identifier of the project being searched.
    pub project_id: String,
    /// Directory holding the `{project_id}.json` document cache.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Directory of exported project payloads used to fill an empty cache.
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    /// Parent selection parameters.
    #[serde(flatten)]
    pub request: ChildRequest,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            project_id: "d1445161-1ac0-4f5c-b085-acf6164396e3".to_string(),
            cache_dir: default_cache_dir(),
            source_dir: None,
            request: ChildRequest::default(),
            random_seed: None,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Parameters for one child-generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildRequest {
    /// Fitness predicate selecting the parent pool.
    #[serde(default)]
    pub query: FitnessQuery,
    /// Field to sort the pool by.
    #[serde(default)]
    pub sort_field: Option<String>,
    /// Sort direction.
    #[serde(default = "default_ascending")]
    pub ascending: bool,
    /// Keep at most this many leading parents after sorting.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Override for the parent count used to pick a breeding strategy.
    #[serde(default)]
    pub parent_count: Option<usize>,
    /// Crossover spread constant (how far interpolation may overshoot the parents).
    #[serde(default = "default_spread")]
    pub spread: f64,
}

impl Default for ChildRequest {
    fn default() -> Self {
        Self {
            query: FitnessQuery::All,
            sort_field: None,
            ascending: default_ascending(),
            limit: None,
            parent_count: None,
            spread: default_spread(),
        }
    }
}

fn default_ascending() -> bool {
    true
}
fn default_spread() -> f64 {
    DEFAULT_SPREAD
}

/// Search configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchConfigError {
    #[error("Project id must not be empty")]
    EmptyProjectId,
    #[error("Spread must be finite and non-negative, got {0}")]
    InvalidSpread(f64),
}

impl ChildRequest {
    pub fn validate(&self) -> Result<(), SearchConfigError> {
        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(SearchConfigError::InvalidSpread(self.spread));
        }
        Ok(())
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(SearchConfigError::EmptyProjectId);
        }
        self.request.validate()
    }

    /// Path of the project's document cache.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{}.json", self.project_id))
    }
}
