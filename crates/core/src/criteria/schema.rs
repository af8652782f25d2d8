//! Criteria schema derivation.
//!
//! A dataset declares which filter criteria it needs through nine boolean
//! flags; those flags are the only source of truth for what a client must
//! supply. [`CRITERIA_TABLE`] maps each flag to exactly one typed field, and
//! both the schema endpoint and the analytics summary consume the same
//! table, so the form and the reporting can never drift apart.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field keys
// ---------------------------------------------------------------------------

pub const KEY_PERIOD: &str = "period";
pub const KEY_UPI: &str = "upi";
pub const KEY_UPI_LIST: &str = "upi_list";
pub const KEY_ID_LIST: &str = "id_list";
pub const KEY_ADMIN_LEVEL: &str = "admin_level";
pub const KEY_USER_LEVEL: &str = "user_level";
pub const KEY_TRANSACTION_TYPE: &str = "transaction_type";
pub const KEY_LAND_USE: &str = "land_use";
pub const KEY_SIZE_RANGE: &str = "size_range";

// ---------------------------------------------------------------------------
// Criteria types
// ---------------------------------------------------------------------------

/// The input control type of a criteria field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaType {
    DateRange,
    MultiSelect,
    Range,
    Text,
}

impl CriteriaType {
    /// Wire/database string for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateRange => "date_range",
            Self::MultiSelect => "multi_select",
            Self::Range => "range",
            Self::Text => "text",
        }
    }
}

/// Where a multi-select field's options come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionsSource {
    /// The province/district/sector/cell/village hierarchy; clients start
    /// from the province list and cascade downward.
    AdministrativeHierarchy,
    UserLevels,
    TransactionTypes,
    LandUseTypes,
}

/// Parcel-holder levels selectable for the `user_level` criteria.
pub const USER_LEVEL_OPTIONS: &[&str] = &["citizen", "notary", "registrar", "surveyor"];

/// Transaction types selectable for the `transaction_type` criteria.
pub const TRANSACTION_TYPE_OPTIONS: &[&str] =
    &["sale", "transfer", "mortgage", "subdivision", "merge"];

/// Land-use classes selectable for the `land_use` criteria.
pub const LAND_USE_OPTIONS: &[&str] = &[
    "residential",
    "commercial",
    "agricultural",
    "industrial",
    "forestry",
    "wetland",
];

impl OptionsSource {
    /// Static option values, where the source is a fixed list.
    ///
    /// The administrative hierarchy returns its top tier (provinces); the
    /// lower tiers cascade from the selection, see
    /// [`crate::criteria::admin_level`].
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Self::AdministrativeHierarchy => crate::criteria::admin_level::PROVINCES,
            Self::UserLevels => USER_LEVEL_OPTIONS,
            Self::TransactionTypes => TRANSACTION_TYPE_OPTIONS,
            Self::LandUseTypes => LAND_USE_OPTIONS,
        }
    }
}

// ---------------------------------------------------------------------------
// Flags and the flag-to-field table
// ---------------------------------------------------------------------------

/// The per-dataset criteria flags, as stored on the dataset row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCriteriaFlags {
    pub requires_period: bool,
    pub requires_upi: bool,
    pub requires_upi_list: bool,
    pub requires_id_list: bool,
    pub has_admin_level: bool,
    pub has_user_level: bool,
    pub has_transaction_type: bool,
    pub has_land_use: bool,
    pub has_size_range: bool,
}

/// One criteria flag, used to index [`CRITERIA_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaFlag {
    RequiresPeriod,
    RequiresUpi,
    RequiresUpiList,
    RequiresIdList,
    HasAdminLevel,
    HasUserLevel,
    HasTransactionType,
    HasLandUse,
    HasSizeRange,
}

impl CriteriaFlag {
    /// Whether this flag is set on the given dataset flags.
    pub fn is_set(&self, flags: &DatasetCriteriaFlags) -> bool {
        match self {
            Self::RequiresPeriod => flags.requires_period,
            Self::RequiresUpi => flags.requires_upi,
            Self::RequiresUpiList => flags.requires_upi_list,
            Self::RequiresIdList => flags.requires_id_list,
            Self::HasAdminLevel => flags.has_admin_level,
            Self::HasUserLevel => flags.has_user_level,
            Self::HasTransactionType => flags.has_transaction_type,
            Self::HasLandUse => flags.has_land_use,
            Self::HasSizeRange => flags.has_size_range,
        }
    }
}

/// One entry of the derived criteria schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaField {
    pub key: &'static str,
    pub label: &'static str,
    pub criteria_type: CriteriaType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options_source: Option<OptionsSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

/// The single declarative flag-to-field table.
///
/// Each flag maps to exactly one field; order here is the order fields are
/// presented to clients.
pub const CRITERIA_TABLE: &[(CriteriaFlag, CriteriaField)] = &[
    (
        CriteriaFlag::RequiresPeriod,
        CriteriaField {
            key: KEY_PERIOD,
            label: "Reporting period",
            criteria_type: CriteriaType::DateRange,
            required: true,
            options_source: None,
            description: Some("Start and end date of the records to include"),
        },
    ),
    (
        CriteriaFlag::RequiresUpi,
        CriteriaField {
            key: KEY_UPI,
            label: "Parcel identifier (UPI)",
            criteria_type: CriteriaType::Text,
            required: true,
            options_source: None,
            description: Some("A single unique parcel identifier"),
        },
    ),
    (
        CriteriaFlag::RequiresUpiList,
        CriteriaField {
            key: KEY_UPI_LIST,
            label: "Parcel identifiers (UPI list)",
            criteria_type: CriteriaType::MultiSelect,
            required: true,
            options_source: None,
            description: Some("One or more unique parcel identifiers"),
        },
    ),
    (
        CriteriaFlag::RequiresIdList,
        CriteriaField {
            key: KEY_ID_LIST,
            label: "National ID list",
            criteria_type: CriteriaType::MultiSelect,
            required: true,
            options_source: None,
            description: Some("One or more national identification numbers"),
        },
    ),
    (
        CriteriaFlag::HasAdminLevel,
        CriteriaField {
            key: KEY_ADMIN_LEVEL,
            label: "Administrative area",
            criteria_type: CriteriaType::MultiSelect,
            required: false,
            options_source: Some(OptionsSource::AdministrativeHierarchy),
            description: Some("Province/district/sector/cell/village filter"),
        },
    ),
    (
        CriteriaFlag::HasUserLevel,
        CriteriaField {
            key: KEY_USER_LEVEL,
            label: "User level",
            criteria_type: CriteriaType::MultiSelect,
            required: false,
            options_source: Some(OptionsSource::UserLevels),
            description: None,
        },
    ),
    (
        CriteriaFlag::HasTransactionType,
        CriteriaField {
            key: KEY_TRANSACTION_TYPE,
            label: "Transaction type",
            criteria_type: CriteriaType::MultiSelect,
            required: false,
            options_source: Some(OptionsSource::TransactionTypes),
            description: None,
        },
    ),
    (
        CriteriaFlag::HasLandUse,
        CriteriaField {
            key: KEY_LAND_USE,
            label: "Land use",
            criteria_type: CriteriaType::MultiSelect,
            required: false,
            options_source: Some(OptionsSource::LandUseTypes),
            description: None,
        },
    ),
    (
        CriteriaFlag::HasSizeRange,
        CriteriaField {
            key: KEY_SIZE_RANGE,
            label: "Parcel size (square metres)",
            criteria_type: CriteriaType::Range,
            required: false,
            options_source: None,
            description: Some("Lower and/or upper bound on parcel size"),
        },
    ),
];

/// Derive the criteria schema for a dataset's flags.
///
/// Pure: the output contains exactly one field per set flag, in table order.
pub fn criteria_schema(flags: &DatasetCriteriaFlags) -> Vec<CriteriaField> {
    CRITERIA_TABLE
        .iter()
        .filter(|(flag, _)| flag.is_set(flags))
        .map(|(_, field)| field.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_yields_empty_schema() {
        assert!(criteria_schema(&DatasetCriteriaFlags::default()).is_empty());
    }

    #[test]
    fn test_all_flags_yield_full_table() {
        let flags = DatasetCriteriaFlags {
            requires_period: true,
            requires_upi: true,
            requires_upi_list: true,
            requires_id_list: true,
            has_admin_level: true,
            has_user_level: true,
            has_transaction_type: true,
            has_land_use: true,
            has_size_range: true,
        };
        let schema = criteria_schema(&flags);
        assert_eq!(schema.len(), CRITERIA_TABLE.len());

        // No duplicate keys in the table.
        let mut keys: Vec<&str> = schema.iter().map(|f| f.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), CRITERIA_TABLE.len());
    }

    #[test]
    fn test_each_flag_contributes_exactly_one_field() {
        // Flip each flag individually and check exactly one field appears.
        let cases: &[(fn(&mut DatasetCriteriaFlags), &str)] = &[
            (|f| f.requires_period = true, KEY_PERIOD),
            (|f| f.requires_upi = true, KEY_UPI),
            (|f| f.requires_upi_list = true, KEY_UPI_LIST),
            (|f| f.requires_id_list = true, KEY_ID_LIST),
            (|f| f.has_admin_level = true, KEY_ADMIN_LEVEL),
            (|f| f.has_user_level = true, KEY_USER_LEVEL),
            (|f| f.has_transaction_type = true, KEY_TRANSACTION_TYPE),
            (|f| f.has_land_use = true, KEY_LAND_USE),
            (|f| f.has_size_range = true, KEY_SIZE_RANGE),
        ];
        for (set, expected_key) in cases {
            let mut flags = DatasetCriteriaFlags::default();
            set(&mut flags);
            let schema = criteria_schema(&flags);
            assert_eq!(schema.len(), 1);
            assert_eq!(schema[0].key, *expected_key);
        }
    }

    #[test]
    fn test_requires_flags_are_required_has_flags_are_optional() {
        let flags = DatasetCriteriaFlags {
            requires_period: true,
            has_admin_level: true,
            ..DatasetCriteriaFlags::default()
        };
        let schema = criteria_schema(&flags);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0].key, KEY_PERIOD);
        assert_eq!(schema[0].criteria_type, CriteriaType::DateRange);
        assert!(schema[0].required);
        assert_eq!(schema[1].key, KEY_ADMIN_LEVEL);
        assert_eq!(schema[1].criteria_type, CriteriaType::MultiSelect);
        assert!(!schema[1].required);
    }

    #[test]
    fn test_fixed_option_sources_are_non_empty() {
        for source in [
            OptionsSource::AdministrativeHierarchy,
            OptionsSource::UserLevels,
            OptionsSource::TransactionTypes,
            OptionsSource::LandUseTypes,
        ] {
            assert!(!source.options().is_empty());
        }
    }
}
