//! Parameter records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A mapping from field name to numeric value.
///
/// Keys are kept sorted, so two records are equal exactly when their sorted
/// `(name, value)` sequences are equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, f64>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a field, if present.
    #[inline]
    pub fn get(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(field.into(), value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Field names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// `(name, value)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Field-for-field equality, independent of insertion order.
    pub fn same_genes(&self, other: &Record) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((k1, v1), (k2, v2))| k1 == k2 && v1 == v2)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Check whether `candidate` equals any record in `pool`.
pub fn is_duplicate(candidate: &Record, pool: &[Record]) -> bool {
    pool.iter().any(|p| p.same_genes(candidate))
}
