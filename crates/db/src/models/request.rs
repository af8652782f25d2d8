//! Access-request models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dataport_core::criteria::values::CriteriaValues;
use dataport_core::error::CoreError;
use dataport_core::types::{DbId, Timestamp};
use dataport_core::workflow::request::RequestStatus;

/// A row from the `access_requests` table.
///
/// `status` and `priority` are stored as text; use [`AccessRequest::status`]
/// to get the typed state-machine value.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccessRequest {
    pub id: DbId,
    pub request_number: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub user_id: DbId,
    pub status: String,
    pub submitted_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AccessRequest {
    /// The typed request status.
    pub fn status(&self) -> Result<RequestStatus, CoreError> {
        RequestStatus::from_str_db(&self.status)
    }
}

/// A row from the `request_datasets` table: one dataset selection with its
/// criteria values, serialized as JSONB.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RequestDataset {
    pub id: DbId,
    pub request_id: DbId,
    pub dataset_id: DbId,
    pub criteria: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RequestDataset {
    /// Deserialize the stored criteria values.
    pub fn criteria_values(&self) -> Result<CriteriaValues, CoreError> {
        serde_json::from_value(self.criteria.clone())
            .map_err(|e| CoreError::Internal(format!("Corrupt criteria payload: {e}")))
    }
}

/// One dataset selection in a create/update body.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSelection {
    pub dataset_id: DbId,
    #[serde(default)]
    pub criteria: CriteriaValues,
}

/// Request body for creating an access request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    pub title: String,
    pub description: String,
    pub priority: Option<String>,
    pub datasets: Vec<DatasetSelection>,
    /// Save as an incomplete draft instead of submitting for review.
    #[serde(default)]
    pub save_as_draft: bool,
}

/// Request body for updating an access request. All fields are optional;
/// supplying `datasets` replaces the full selection set.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub datasets: Option<Vec<DatasetSelection>>,
}

/// Filter options for listing access requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

