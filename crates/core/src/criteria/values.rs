//! Typed criteria values and completeness validation.
//!
//! Criteria values are a tagged union keyed by the schema entry's declared
//! type, so validation and preview-query construction are exhaustive: a
//! value of the wrong variant for its field is a validation failure, not a
//! silent coercion. "Incomplete" is a normal return value
//! ([`CriteriaValidation`]), never an error.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::criteria::schema::{CriteriaField, CriteriaType};

/// A single criteria value, tagged by its input type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CriteriaValue {
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    MultiSelect {
        values: Vec<String>,
    },
    Range {
        min: Option<f64>,
        max: Option<f64>,
    },
    Text {
        value: String,
    },
}

impl CriteriaValue {
    /// Type-specific emptiness rule.
    ///
    /// A date range needs both bounds; a multi-select needs at least one
    /// value; a range needs at least one bound; text needs a non-empty
    /// trimmed string.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::DateRange { from, to } => from.is_none() || to.is_none(),
            Self::MultiSelect { values } => values.is_empty(),
            Self::Range { min, max } => min.is_none() && max.is_none(),
            Self::Text { value } => value.trim().is_empty(),
        }
    }

    /// Whether this value's variant matches a declared field type.
    pub fn matches_type(&self, criteria_type: CriteriaType) -> bool {
        matches!(
            (self, criteria_type),
            (Self::DateRange { .. }, CriteriaType::DateRange)
                | (Self::MultiSelect { .. }, CriteriaType::MultiSelect)
                | (Self::Range { .. }, CriteriaType::Range)
                | (Self::Text { .. }, CriteriaType::Text)
        )
    }
}

/// Criteria values keyed by schema field key. Ordered so serialization is
/// deterministic (see [`criteria_fingerprint`]).
pub type CriteriaValues = BTreeMap<String, CriteriaValue>;

/// Result of validating criteria values against a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CriteriaValidation {
    /// Required keys that are absent or empty by their type rule.
    pub missing_keys: Vec<String>,
    /// Supplied keys that are unknown or of the wrong variant.
    pub invalid_keys: Vec<String>,
}

impl CriteriaValidation {
    /// Whether the values satisfy the schema.
    pub fn is_valid(&self) -> bool {
        self.missing_keys.is_empty() && self.invalid_keys.is_empty()
    }
}

/// Validate criteria values against a derived schema.
///
/// Every required field must carry a non-empty value of the declared
/// variant; optional fields may be absent but must match their declared
/// variant when present. Keys not in the schema are invalid, keeping the
/// flag table the single source of truth. Key lists come back sorted.
pub fn validate_criteria_values(
    schema: &[CriteriaField],
    values: &CriteriaValues,
) -> CriteriaValidation {
    let mut result = CriteriaValidation::default();

    for field in schema {
        match values.get(field.key) {
            Some(value) if !value.matches_type(field.criteria_type) => {
                result.invalid_keys.push(field.key.to_string());
            }
            Some(value) => {
                if field.required && value.is_empty() {
                    result.missing_keys.push(field.key.to_string());
                }
            }
            None => {
                if field.required {
                    result.missing_keys.push(field.key.to_string());
                }
            }
        }
    }

    for key in values.keys() {
        if !schema.iter().any(|f| f.key == key.as_str()) {
            result.invalid_keys.push(key.clone());
        }
    }

    result.missing_keys.sort_unstable();
    result.invalid_keys.sort_unstable();
    result
}

/// Fingerprint of a criteria value set.
///
/// SHA-256 over the canonical JSON encoding (the map is ordered, so the
/// encoding is deterministic). Preview responses carry this so a caller can
/// tell that criteria changed since a preview was produced and drop the
/// stale result.
pub fn criteria_fingerprint(values: &CriteriaValues) -> String {
    let canonical =
        serde_json::to_vec(values).expect("criteria values always serialize to JSON");
    let digest = Sha256::digest(&canonical);
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::schema::{
        criteria_schema, DatasetCriteriaFlags, KEY_ADMIN_LEVEL, KEY_PERIOD, KEY_SIZE_RANGE,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period_admin_schema() -> Vec<CriteriaField> {
        criteria_schema(&DatasetCriteriaFlags {
            requires_period: true,
            has_admin_level: true,
            ..DatasetCriteriaFlags::default()
        })
    }

    #[test]
    fn test_date_range_needs_both_bounds() {
        let half = CriteriaValue::DateRange {
            from: Some(date(2025, 1, 1)),
            to: None,
        };
        assert!(half.is_empty());

        let full = CriteriaValue::DateRange {
            from: Some(date(2025, 1, 1)),
            to: Some(date(2025, 12, 31)),
        };
        assert!(!full.is_empty());
    }

    #[test]
    fn test_multi_select_needs_one_value() {
        assert!(CriteriaValue::MultiSelect { values: vec![] }.is_empty());
        assert!(!CriteriaValue::MultiSelect {
            values: vec!["sale".to_string()]
        }
        .is_empty());
    }

    #[test]
    fn test_range_needs_either_bound() {
        assert!(CriteriaValue::Range {
            min: None,
            max: None
        }
        .is_empty());
        assert!(!CriteriaValue::Range {
            min: Some(100.0),
            max: None
        }
        .is_empty());
        assert!(!CriteriaValue::Range {
            min: None,
            max: Some(5_000.0)
        }
        .is_empty());
    }

    #[test]
    fn test_text_needs_non_blank_content() {
        assert!(CriteriaValue::Text {
            value: "   ".to_string()
        }
        .is_empty());
        assert!(!CriteriaValue::Text {
            value: "1/02/03/04/555".to_string()
        }
        .is_empty());
    }

    #[test]
    fn test_missing_required_key_reported() {
        // Schema: period (required date range) + admin_level (optional
        // multi-select). Supplying only admin_level must flag period.
        let schema = period_admin_schema();
        let mut values = CriteriaValues::new();
        values.insert(
            KEY_ADMIN_LEVEL.to_string(),
            CriteriaValue::MultiSelect {
                values: vec!["Northern".to_string()],
            },
        );

        let result = validate_criteria_values(&schema, &values);
        assert!(!result.is_valid());
        assert_eq!(result.missing_keys, vec![KEY_PERIOD.to_string()]);
        assert!(result.invalid_keys.is_empty());
    }

    #[test]
    fn test_complete_values_pass() {
        let schema = period_admin_schema();
        let mut values = CriteriaValues::new();
        values.insert(
            KEY_PERIOD.to_string(),
            CriteriaValue::DateRange {
                from: Some(date(2025, 1, 1)),
                to: Some(date(2025, 6, 30)),
            },
        );

        let result = validate_criteria_values(&schema, &values);
        assert!(result.is_valid(), "optional fields may be absent");
    }

    #[test]
    fn test_wrong_variant_is_invalid_not_missing() {
        let schema = period_admin_schema();
        let mut values = CriteriaValues::new();
        values.insert(
            KEY_PERIOD.to_string(),
            CriteriaValue::Text {
                value: "2025".to_string(),
            },
        );

        let result = validate_criteria_values(&schema, &values);
        assert_eq!(result.invalid_keys, vec![KEY_PERIOD.to_string()]);
        assert!(result.missing_keys.is_empty());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let schema = period_admin_schema();
        let mut values = CriteriaValues::new();
        values.insert(
            KEY_PERIOD.to_string(),
            CriteriaValue::DateRange {
                from: Some(date(2025, 1, 1)),
                to: Some(date(2025, 6, 30)),
            },
        );
        values.insert(
            KEY_SIZE_RANGE.to_string(),
            CriteriaValue::Range {
                min: Some(1.0),
                max: None,
            },
        );

        let result = validate_criteria_values(&schema, &values);
        assert_eq!(result.invalid_keys, vec![KEY_SIZE_RANGE.to_string()]);
    }

    #[test]
    fn test_empty_optional_value_is_not_missing() {
        let schema = period_admin_schema();
        let mut values = CriteriaValues::new();
        values.insert(
            KEY_PERIOD.to_string(),
            CriteriaValue::DateRange {
                from: Some(date(2025, 1, 1)),
                to: Some(date(2025, 6, 30)),
            },
        );
        values.insert(
            KEY_ADMIN_LEVEL.to_string(),
            CriteriaValue::MultiSelect { values: vec![] },
        );

        let result = validate_criteria_values(&schema, &values);
        assert!(result.is_valid());
    }

    #[test]
    fn test_fingerprint_changes_with_values() {
        let mut values = CriteriaValues::new();
        values.insert(
            KEY_PERIOD.to_string(),
            CriteriaValue::DateRange {
                from: Some(date(2025, 1, 1)),
                to: Some(date(2025, 6, 30)),
            },
        );
        let before = criteria_fingerprint(&values);

        values.insert(
            KEY_PERIOD.to_string(),
            CriteriaValue::DateRange {
                from: Some(date(2025, 1, 1)),
                to: Some(date(2025, 7, 31)),
            },
        );
        let after = criteria_fingerprint(&values);

        assert_ne!(before, after);
        // Deterministic for identical input.
        assert_eq!(after, criteria_fingerprint(&values));
    }

    #[test]
    fn test_value_json_shape_is_tagged() {
        let value = CriteriaValue::MultiSelect {
            values: vec!["sale".to_string()],
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["type"], "multi_select");
        assert_eq!(json["values"][0], "sale");
    }
}
