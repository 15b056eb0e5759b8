//! Duplicate and validity gate for candidate children.

use std::fmt;

use crate::schema::{FieldViolation, ProjectSchema, Record, is_duplicate};

/// Why a candidate was turned away.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("Candidate duplicates an existing parent")]
    Duplicate,
    #[error("Candidate does not fit schema: {}", Violations(.0))]
    SchemaViolation(Vec<FieldViolation>),
}

struct Violations<'a>(&'a [FieldViolation]);

impl fmt::Display for Violations<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

/// Accept `candidate` unless it duplicates a parent or breaks the schema.
///
/// The duplicate check runs first.
pub fn accept(
    candidate: Record,
    parents: &[Record],
    schema: &ProjectSchema,
) -> Result<Record, Rejection> {
    if is_duplicate(&candidate, parents) {
        return Err(Rejection::Duplicate);
    }
    schema
        .validate_record(&candidate)
        .map_err(Rejection::SchemaViolation)?;
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BaseType, FieldDescriptor, ViolationKind};

    fn schema() -> ProjectSchema {
        ProjectSchema::new(vec![
            FieldDescriptor::new("x", BaseType::Int, (0.0, 10.0), 1.0),
            FieldDescriptor::new("y", BaseType::Float, (0.0, 1.0), 0.1),
        ])
        .unwrap()
    }

    #[test]
    fn test_accepts_fresh_valid_record() {
        let parents = vec![Record::from_iter([("x", 1.0), ("y", 0.5)])];
        let candidate = Record::from_iter([("x", 2.0), ("y", 0.5)]);
        assert_eq!(accept(candidate.clone(), &parents, &schema()), Ok(candidate));
    }

    #[test]
    fn test_rejects_duplicate() {
        let parents = vec![Record::from_iter([("y", 0.5), ("x", 1.0)])];
        let candidate = Record::from_iter([("x", 1.0), ("y", 0.5)]);
        assert_eq!(
            accept(candidate, &parents, &schema()),
            Err(Rejection::Duplicate)
        );
    }

    #[test]
    fn test_rejects_schema_violation_with_detail() {
        let candidate = Record::from_iter([("x", 11.0), ("y", 0.5)]);
        let Err(Rejection::SchemaViolation(violations)) = accept(candidate, &[], &schema()) else {
            panic!("expected schema violation");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "x");
        assert!(matches!(
            violations[0].kind,
            ViolationKind::OutOfRange { value, .. } if value == 11.0
        ));
    }

    #[test]
    fn test_rejection_message_lists_fields() {
        let candidate = Record::from_iter([("x", 2.5), ("y", 2.0)]);
        let err = accept(candidate, &[], &schema()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("x: 2.5 is not an integer"));
        assert!(message.contains("y: 2 outside [0, 1]"));
    }
}
