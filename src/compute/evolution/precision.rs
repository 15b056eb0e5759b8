//! Significant-digit truncation for generated values.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::schema::{ProjectSchema, Record};

use super::GenerationError;

/// Truncate `value` toward zero to `digits` significant digits.
///
/// Works on the mantissa of the shortest decimal representation of the
/// float, so `0.5678` truncates to `0.56` rather than tripping over its binary
/// expansion, and the exponent is carried over untouched. Any finite
/// magnitude is accepted. Returns `None` for non-finite values or zero digits.
pub fn truncate_to_precision(value: f64, digits: u32) -> Option<f64> {
    if !value.is_finite() || digits == 0 {
        return None;
    }
    if value == 0.0 {
        return Some(value);
    }

    // `{:e}` yields `d.ddde±x` with at most 17 mantissa digits.
    let formatted = format!("{:e}", value);
    let (mantissa, exponent) = formatted.split_once('e')?;

    let truncated = Decimal::from_str(mantissa)
        .ok()?
        .round_sf_with_strategy(digits, RoundingStrategy::ToZero)?;
    format!("{}e{}", truncated.normalize(), exponent).parse().ok()
}

/// Apply a field's precision, if it declares one.
pub(crate) fn limit_field(
    name: &str,
    precision: Option<u32>,
    value: f64,
) -> Result<f64, GenerationError> {
    match precision {
        None => Ok(value),
        Some(digits) => {
            truncate_to_precision(value, digits).ok_or_else(|| GenerationError::Precision {
                field: name.to_string(),
                value,
                precision: digits,
            })
        }
    }
}

/// Truncate every field of `record` that declares a precision.
///
/// Fields without a precision, or absent from the schema, pass through.
pub fn normalize(record: &Record, schema: &ProjectSchema) -> Result<Record, GenerationError> {
    record
        .iter()
        .map(|(name, value)| {
            let precision = schema.field(name).and_then(|f| f.precision);
            limit_field(name, precision, value).map(|v| (name, v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BaseType, FieldDescriptor};

    #[test]
    fn test_truncates_not_rounds() {
        assert_eq!(truncate_to_precision(0.5678, 2), Some(0.56));
        assert_eq!(truncate_to_precision(0.999, 1), Some(0.9));
        assert_eq!(truncate_to_precision(2.71828, 3), Some(2.71));
    }

    #[test]
    fn test_counts_significant_digits() {
        assert_eq!(truncate_to_precision(1234.5, 2), Some(1200.0));
        assert_eq!(truncate_to_precision(0.0012345, 2), Some(0.0012));
        assert_eq!(truncate_to_precision(15.0, 1), Some(10.0));
    }

    #[test]
    fn test_truncates_toward_zero() {
        assert_eq!(truncate_to_precision(-0.5678, 2), Some(-0.56));
    }

    #[test]
    fn test_short_values_unchanged() {
        assert_eq!(truncate_to_precision(0.5, 3), Some(0.5));
        assert_eq!(truncate_to_precision(7.0, 4), Some(7.0));
        assert_eq!(truncate_to_precision(0.0, 2), Some(0.0));
    }

    #[test]
    fn test_magnitude_outside_decimal_range() {
        assert_eq!(truncate_to_precision(1e29, 2), Some(1e29));
        assert_eq!(truncate_to_precision(1.2345e29, 2), Some(1.2e29));
        assert_eq!(truncate_to_precision(-9.876e300, 3), Some(-9.87e300));
        assert_eq!(truncate_to_precision(1e-30, 2), Some(1e-30));
        assert_eq!(truncate_to_precision(1.239e-30, 3), Some(1.23e-30));
        assert_eq!(truncate_to_precision(f64::MAX, 1), Some(1e308));
        assert_eq!(truncate_to_precision(5e-324, 2), Some(5e-324));
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(truncate_to_precision(f64::NAN, 2), None);
        assert_eq!(truncate_to_precision(f64::INFINITY, 2), None);
        assert_eq!(truncate_to_precision(1.0, 0), None);
    }

    #[test]
    fn test_normalize_record() {
        let schema = ProjectSchema::new(vec![
            FieldDescriptor::new("x", BaseType::Int, (0.0, 10.0), 1.0),
            FieldDescriptor::new("y", BaseType::Float, (0.0, 1.0), 0.1).with_precision(2),
        ])
        .unwrap();
        let record = Record::from_iter([("x", 7.0), ("y", 0.5678)]);

        let normalized = normalize(&record, &schema).unwrap();
        assert_eq!(normalized.get("x"), Some(7.0));
        assert_eq!(normalized.get("y"), Some(0.56));
    }

    #[test]
    fn test_limit_field_error_names_field() {
        let err = limit_field("y", Some(2), f64::NAN).unwrap_err();
        assert!(matches!(err, GenerationError::Precision { ref field, .. } if field == "y"));
    }
}
