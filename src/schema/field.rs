//! Field descriptors and project schemas.
//!
//! A schema is the ordered list of numeric fields a project's records carry.
//! Field order drives generation and validation; names are unique.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Record;

/// Largest magnitude below which every integer is exact in an `f64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Base numeric type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BaseType {
    Int,
    Float,
    Double,
}

impl BaseType {
    /// Whether values of this type may carry a fractional part.
    #[inline]
    pub fn is_fractional(self) -> bool {
        matches!(self, BaseType::Float | BaseType::Double)
    }
}

/// Description of a single schema field.
///
/// Serialized with the `field_*` key names used by cached schema tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, unique within the schema.
    #[serde(rename = "field_name")]
    pub name: String,
    /// Base numeric type.
    #[serde(rename = "field_type")]
    pub base_type: BaseType,
    /// Inclusive `(min, max)` range.
    #[serde(rename = "field_range")]
    pub range: (f64, f64),
    /// Mutation step size.
    #[serde(rename = "field_step")]
    pub step: f64,
    /// Number of significant digits kept after generation.
    #[serde(rename = "field_precision", default)]
    pub precision: Option<u32>,
}

impl FieldDescriptor {
    /// Create a field without a precision limit.
    pub fn new(name: impl Into<String>, base_type: BaseType, range: (f64, f64), step: f64) -> Self {
        Self {
            name: name.into(),
            base_type,
            range,
            step,
            precision: None,
        }
    }

    /// Set the precision limit.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.range.0
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.range.1
    }

    /// Clamp a value into the field's range.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.range.0, self.range.1)
    }

    /// Check a single value against the field's type and range.
    pub fn check(&self, value: f64) -> Option<ViolationKind> {
        if !value.is_finite() {
            return Some(ViolationKind::NotFinite);
        }
        if value < self.range.0 || value > self.range.1 {
            return Some(ViolationKind::OutOfRange {
                value,
                min: self.range.0,
                max: self.range.1,
            });
        }
        if !self.base_type.is_fractional() && value.fract() != 0.0 {
            return Some(ViolationKind::NotInteger { value });
        }
        None
    }

    fn validate(&self) -> Result<(), SchemaError> {
        let (min, max) = self.range;
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(SchemaError::InvalidRange {
                field: self.name.clone(),
                min,
                max,
            });
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(SchemaError::InvalidStep {
                field: self.name.clone(),
                step: self.step,
            });
        }
        if self.precision == Some(0) {
            return Err(SchemaError::ZeroPrecision {
                field: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Ordered, validated collection of field descriptors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProjectSchema {
    fields: Vec<FieldDescriptor>,
}

impl ProjectSchema {
    /// Build a schema, checking names, ranges, steps and precisions.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            field.validate()?;
        }

        Ok(Self { fields })
    }

    /// Fields in declared order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reorder a record's values into declared field order.
    ///
    /// Missing fields come back as `None`.
    pub fn flatten(&self, record: &Record) -> Vec<Option<f64>> {
        self.fields.iter().map(|f| record.get(&f.name)).collect()
    }

    /// Validate a record against every field.
    ///
    /// Returns the full list of violations; an empty list means the record fits.
    pub fn violations(&self, record: &Record) -> Vec<FieldViolation> {
        let mut violations: Vec<FieldViolation> = self
            .fields
            .iter()
            .zip(self.flatten(record))
            .filter_map(|(field, value)| {
                let kind = match value {
                    Some(v) => field.check(v)?,
                    None => ViolationKind::Missing,
                };
                Some(FieldViolation {
                    field: field.name.clone(),
                    kind,
                })
            })
            .collect();

        violations.extend(
            record
                .field_names()
                .filter(|name| self.field(name).is_none())
                .map(|name| FieldViolation {
                    field: name.to_string(),
                    kind: ViolationKind::Unknown,
                }),
        );

        violations
    }

    /// JSON form of a record with integral INT values written as integers.
    ///
    /// Fields outside the schema keep their float form.
    pub fn record_json(&self, record: &Record) -> Value {
        let map: Map<String, Value> = record
            .iter()
            .map(|(name, value)| {
                let integral = self
                    .field(name)
                    .is_some_and(|f| !f.base_type.is_fractional())
                    && value.fract() == 0.0
                    && value.abs() <= MAX_EXACT_INT;
                let json = if integral {
                    Value::from(value as i64)
                } else {
                    Value::from(value)
                };
                (name.to_string(), json)
            })
            .collect();
        Value::Object(map)
    }

    /// Validate a record, failing with its violations.
    pub fn validate_record(&self, record: &Record) -> Result<(), Vec<FieldViolation>> {
        let violations = self.violations(record);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl<'de> Deserialize<'de> for ProjectSchema {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Vec::<FieldDescriptor>::deserialize(deserializer)?;
        ProjectSchema::new(fields).map_err(serde::de::Error::custom)
    }
}

/// A single failed field check.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
}

/// What went wrong with a field value.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    Missing,
    Unknown,
    NotFinite,
    NotInteger { value: f64 },
    OutOfRange { value: f64, min: f64, max: f64 },
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Missing => write!(f, "{}: missing", self.field),
            ViolationKind::Unknown => write!(f, "{}: not in schema", self.field),
            ViolationKind::NotFinite => write!(f, "{}: not a finite number", self.field),
            ViolationKind::NotInteger { value } => {
                write!(f, "{}: {} is not an integer", self.field, value)
            }
            ViolationKind::OutOfRange { value, min, max } => {
                write!(f, "{}: {} outside [{}, {}]", self.field, value, min, max)
            }
        }
    }
}

/// Schema validation errors.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema has no fields")]
    Empty,
    #[error("Field {0} is declared more than once")]
    DuplicateField(String),
    #[error("Field {field} has invalid range [{min}, {max}]")]
    InvalidRange { field: String, min: f64, max: f64 },
    #[error("Field {field} has invalid step {step}")]
    InvalidStep { field: String, step: f64 },
    #[error("Field {field} declares zero precision")]
    ZeroPrecision { field: String },
}
