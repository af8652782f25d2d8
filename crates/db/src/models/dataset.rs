//! Dataset, category, and reviewer-assignment models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dataport_core::criteria::schema::DatasetCriteriaFlags;
use dataport_core::types::{DbId, Timestamp};
use dataport_core::workflow::request::ApprovalPolicy;

/// A row from the `datasets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dataset {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<DbId>,
    pub requires_period: bool,
    pub requires_upi: bool,
    pub requires_upi_list: bool,
    pub requires_id_list: bool,
    pub has_admin_level: bool,
    pub has_user_level: bool,
    pub has_transaction_type: bool,
    pub has_land_use: bool,
    pub has_size_range: bool,
    pub requires_approval: bool,
    pub auto_approve_roles: Vec<String>,
    pub allows_recurring: bool,
    pub deactivated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Dataset {
    /// The criteria flags in the form the schema engine consumes.
    pub fn criteria_flags(&self) -> DatasetCriteriaFlags {
        DatasetCriteriaFlags {
            requires_period: self.requires_period,
            requires_upi: self.requires_upi,
            requires_upi_list: self.requires_upi_list,
            requires_id_list: self.requires_id_list,
            has_admin_level: self.has_admin_level,
            has_user_level: self.has_user_level,
            has_transaction_type: self.has_transaction_type,
            has_land_use: self.has_land_use,
            has_size_range: self.has_size_range,
        }
    }

    /// The approval policy in the form the submission logic consumes.
    pub fn approval_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy {
            requires_approval: self.requires_approval,
            auto_approve_roles: self.auto_approve_roles.clone(),
        }
    }

    /// Whether this dataset is currently available for new requests.
    pub fn is_active(&self) -> bool {
        self.deactivated_at.is_none()
    }
}

/// DTO for creating a new dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDataset {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<DbId>,
    #[serde(default)]
    pub criteria_flags: DatasetCriteriaFlags,
    #[serde(default = "default_requires_approval")]
    pub requires_approval: bool,
    #[serde(default)]
    pub auto_approve_roles: Vec<String>,
    #[serde(default)]
    pub allows_recurring: bool,
}

fn default_requires_approval() -> bool {
    true
}

/// DTO for updating a dataset. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDataset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<DbId>,
    pub criteria_flags: Option<DatasetCriteriaFlags>,
    pub requires_approval: Option<bool>,
    pub auto_approve_roles: Option<Vec<String>>,
    pub allows_recurring: Option<bool>,
}

/// A row from the `dataset_categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DatasetCategory {
    pub id: DbId,
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new dataset category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
}

/// DTO for updating a dataset category.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
}

/// A row from the `dataset_reviewers` table: one configured reviewer
/// assignment for a dataset, with its workflow level and in-level order.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DatasetReviewer {
    pub id: DbId,
    pub dataset_id: DbId,
    pub reviewer_user_id: DbId,
    pub review_level: i32,
    pub review_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One entry of the reviewer configuration body.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewerAssignment {
    pub reviewer_user_id: DbId,
    pub review_level: i32,
    pub review_order: i32,
}
