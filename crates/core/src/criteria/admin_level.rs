//! Cascading administrative-hierarchy selection.
//!
//! The administrative filter has five ordered tiers: province, district,
//! sector, cell, village. Changing the selection at one tier clears every
//! tier below it in the same call, so a child selection can never reference
//! a deselected parent. All mutation goes through
//! [`AdminLevelSelection::set_tier`]; there is no way to observe an
//! intermediate state.

use serde::{Deserialize, Serialize};

use crate::criteria::values::CriteriaValue;

/// Top-tier options for the administrative hierarchy.
pub const PROVINCES: &[&str] = &[
    "Kigali City",
    "Northern",
    "Southern",
    "Eastern",
    "Western",
];

/// The five tiers, ordered from broadest to narrowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminTier {
    Province,
    District,
    Sector,
    Cell,
    Village,
}

impl AdminTier {
    /// All tiers in cascade order.
    pub const ALL: [AdminTier; 5] = [
        Self::Province,
        Self::District,
        Self::Sector,
        Self::Cell,
        Self::Village,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Province => "Province",
            Self::District => "District",
            Self::Sector => "Sector",
            Self::Cell => "Cell",
            Self::Village => "Village",
        }
    }
}

/// The current selection across all five tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminLevelSelection {
    provinces: Vec<String>,
    districts: Vec<String>,
    sectors: Vec<String>,
    cells: Vec<String>,
    villages: Vec<String>,
}

impl AdminLevelSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection at one tier, clearing every tier below it.
    ///
    /// This is the only mutation point, so the cascade invariant holds
    /// atomically: after the call, no child tier can hold values whose
    /// parent tier just changed.
    pub fn set_tier(&mut self, tier: AdminTier, values: Vec<String>) {
        match tier {
            AdminTier::Province => {
                self.provinces = values;
                self.districts.clear();
                self.sectors.clear();
                self.cells.clear();
                self.villages.clear();
            }
            AdminTier::District => {
                self.districts = values;
                self.sectors.clear();
                self.cells.clear();
                self.villages.clear();
            }
            AdminTier::Sector => {
                self.sectors = values;
                self.cells.clear();
                self.villages.clear();
            }
            AdminTier::Cell => {
                self.cells = values;
                self.villages.clear();
            }
            AdminTier::Village => {
                self.villages = values;
            }
        }
    }

    /// The selected values at one tier.
    pub fn tier(&self, tier: AdminTier) -> &[String] {
        match tier {
            AdminTier::Province => &self.provinces,
            AdminTier::District => &self.districts,
            AdminTier::Sector => &self.sectors,
            AdminTier::Cell => &self.cells,
            AdminTier::Village => &self.villages,
        }
    }

    /// Whether nothing is selected at any tier.
    pub fn is_empty(&self) -> bool {
        AdminTier::ALL.iter().all(|t| self.tier(*t).is_empty())
    }

    /// The narrowest tier with a non-empty selection, if any.
    pub fn narrowest_tier(&self) -> Option<AdminTier> {
        AdminTier::ALL
            .iter()
            .rev()
            .copied()
            .find(|t| !self.tier(*t).is_empty())
    }

    /// Collapse to the `admin_level` criteria value.
    ///
    /// The filter a query needs is the narrowest selected tier; broader
    /// tiers are implied by the hierarchy.
    pub fn to_criteria_value(&self) -> CriteriaValue {
        let values = self
            .narrowest_tier()
            .map(|t| self.tier(t).to_vec())
            .unwrap_or_default();
        CriteriaValue::MultiSelect { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parent_change_clears_all_descendants() {
        let mut sel = AdminLevelSelection::new();
        sel.set_tier(AdminTier::Province, strs(&["Northern", "Southern"]));
        sel.set_tier(AdminTier::District, strs(&["Musanze"]));
        sel.set_tier(AdminTier::Sector, strs(&["Muhoza"]));
        sel.set_tier(AdminTier::Cell, strs(&["Ruhengeri"]));
        sel.set_tier(AdminTier::Village, strs(&["Kabeza"]));

        // Narrowing the province selection must drop every child tier.
        sel.set_tier(AdminTier::Province, strs(&["Northern"]));

        assert_eq!(sel.tier(AdminTier::Province), strs(&["Northern"]));
        for tier in [
            AdminTier::District,
            AdminTier::Sector,
            AdminTier::Cell,
            AdminTier::Village,
        ] {
            assert!(
                sel.tier(tier).is_empty(),
                "{} survived a province change",
                tier.label()
            );
        }
    }

    #[test]
    fn test_mid_tier_change_preserves_ancestors() {
        let mut sel = AdminLevelSelection::new();
        sel.set_tier(AdminTier::Province, strs(&["Eastern"]));
        sel.set_tier(AdminTier::District, strs(&["Kayonza"]));
        sel.set_tier(AdminTier::Sector, strs(&["Mukarange"]));
        sel.set_tier(AdminTier::Cell, strs(&["Bwiza"]));

        sel.set_tier(AdminTier::District, strs(&["Ngoma"]));

        assert_eq!(sel.tier(AdminTier::Province), strs(&["Eastern"]));
        assert_eq!(sel.tier(AdminTier::District), strs(&["Ngoma"]));
        assert!(sel.tier(AdminTier::Sector).is_empty());
        assert!(sel.tier(AdminTier::Cell).is_empty());
    }

    #[test]
    fn test_village_change_clears_nothing_else() {
        let mut sel = AdminLevelSelection::new();
        sel.set_tier(AdminTier::Province, strs(&["Western"]));
        sel.set_tier(AdminTier::District, strs(&["Rubavu"]));
        sel.set_tier(AdminTier::Village, strs(&["Byahi"]));

        assert_eq!(sel.tier(AdminTier::Province), strs(&["Western"]));
        assert_eq!(sel.tier(AdminTier::District), strs(&["Rubavu"]));
        assert_eq!(sel.tier(AdminTier::Village), strs(&["Byahi"]));
    }

    #[test]
    fn test_criteria_value_uses_narrowest_tier() {
        let mut sel = AdminLevelSelection::new();
        assert_eq!(
            sel.to_criteria_value(),
            CriteriaValue::MultiSelect { values: vec![] }
        );

        sel.set_tier(AdminTier::Province, strs(&["Southern"]));
        sel.set_tier(AdminTier::District, strs(&["Huye", "Nyanza"]));
        assert_eq!(sel.narrowest_tier(), Some(AdminTier::District));
        assert_eq!(
            sel.to_criteria_value(),
            CriteriaValue::MultiSelect {
                values: strs(&["Huye", "Nyanza"])
            }
        );
    }

    #[test]
    fn test_empty_selection_reports_empty() {
        let sel = AdminLevelSelection::new();
        assert!(sel.is_empty());
        assert_eq!(sel.narrowest_tier(), None);
    }
}
