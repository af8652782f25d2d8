//! Review assignment and decision models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dataport_core::error::CoreError;
use dataport_core::types::{DbId, Timestamp};
use dataport_core::workflow::review::{ReviewState, ReviewStatus};

/// A row from the `request_reviews` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RequestReview {
    pub id: DbId,
    pub request_id: DbId,
    pub request_dataset_id: Option<DbId>,
    pub reviewer_user_id: DbId,
    pub review_level: i32,
    pub review_order: i32,
    pub review_status: String,
    pub review_notes: Option<String>,
    pub assigned_at: Timestamp,
    pub decided_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RequestReview {
    /// The typed review status.
    pub fn status(&self) -> Result<ReviewStatus, CoreError> {
        ReviewStatus::from_str_db(&self.review_status)
    }

    /// Project to the aggregation input.
    pub fn to_state(&self) -> Result<ReviewState, CoreError> {
        Ok(ReviewState {
            id: self.id,
            reviewer_user_id: self.reviewer_user_id,
            review_level: self.review_level,
            status: self.status()?,
        })
    }
}

/// DTO for materializing one reviewer assignment on submission.
#[derive(Debug, Clone)]
pub struct CreateReview {
    pub request_id: DbId,
    pub request_dataset_id: Option<DbId>,
    pub reviewer_user_id: DbId,
    pub review_level: i32,
    pub review_order: i32,
}

/// Request body for posting a review decision.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionRequest {
    /// One of `in_progress`, `approved`, `rejected`, `changes_requested`.
    pub decision: String,
    pub notes: Option<String>,
}

/// A review row joined with request context, for the reviewer inbox.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReviewInboxItem {
    pub id: DbId,
    pub request_id: DbId,
    pub request_number: String,
    pub request_title: String,
    pub request_status: String,
    pub review_level: i32,
    pub review_order: i32,
    pub review_status: String,
    pub assigned_at: Timestamp,
}
