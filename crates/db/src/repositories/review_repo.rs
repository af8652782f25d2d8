//! Repository for the `request_reviews` table.

use sqlx::PgExecutor;

use dataport_core::types::DbId;

use crate::models::review::{CreateReview, RequestReview, ReviewInboxItem};

/// Column list for request_reviews queries.
const COLUMNS: &str = "id, request_id, request_dataset_id, reviewer_user_id, \
    review_level, review_order, review_status, review_notes, \
    assigned_at, decided_at, created_at, updated_at";

/// Provides operations for reviewer assignments and decisions.
pub struct ReviewRepo;

impl ReviewRepo {
    /// Materialize one reviewer assignment.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateReview,
    ) -> Result<RequestReview, sqlx::Error> {
        let query = format!(
            "INSERT INTO request_reviews
                (request_id, request_dataset_id, reviewer_user_id, review_level, review_order)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RequestReview>(&query)
            .bind(input.request_id)
            .bind(input.request_dataset_id)
            .bind(input.reviewer_user_id)
            .bind(input.review_level)
            .bind(input.review_order)
            .fetch_one(executor)
            .await
    }

    /// Find a review by ID.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<RequestReview>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM request_reviews WHERE id = $1");
        sqlx::query_as::<_, RequestReview>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List all reviews for a request, ordered by level then order.
    pub async fn list_for_request(
        executor: impl PgExecutor<'_>,
        request_id: DbId,
    ) -> Result<Vec<RequestReview>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM request_reviews
             WHERE request_id = $1
             ORDER BY review_level ASC, review_order ASC"
        );
        sqlx::query_as::<_, RequestReview>(&query)
            .bind(request_id)
            .fetch_all(executor)
            .await
    }

    /// Count resolved reviews for a request. Gate for request deletion.
    pub async fn count_resolved_for_request(
        executor: impl PgExecutor<'_>,
        request_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM request_reviews
             WHERE request_id = $1
               AND review_status IN ('approved', 'rejected', 'changes_requested')",
        )
        .bind(request_id)
        .fetch_one(executor)
        .await
    }

    /// The reviewer's inbox: their review rows joined with request context,
    /// optionally filtered by review status, newest assignment first.
    pub async fn list_for_reviewer(
        executor: impl PgExecutor<'_>,
        reviewer_user_id: DbId,
        status: Option<&str>,
    ) -> Result<Vec<ReviewInboxItem>, sqlx::Error> {
        sqlx::query_as::<_, ReviewInboxItem>(
            "SELECT
                rr.id,
                rr.request_id,
                ar.request_number,
                ar.title AS request_title,
                ar.status AS request_status,
                rr.review_level,
                rr.review_order,
                rr.review_status,
                rr.assigned_at
             FROM request_reviews rr
             JOIN access_requests ar ON ar.id = rr.request_id
             WHERE rr.reviewer_user_id = $1
               AND ($2::text IS NULL OR rr.review_status = $2)
             ORDER BY rr.assigned_at DESC",
        )
        .bind(reviewer_user_id)
        .bind(status)
        .fetch_all(executor)
        .await
    }

    /// Record a decision on a review row, guarded so only an undecided row
    /// can be decided. `in_progress` leaves `decided_at` unset.
    ///
    /// Returns `None` if the row does not exist or is already decided.
    pub async fn record_decision(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: &str,
        notes: Option<&str>,
    ) -> Result<Option<RequestReview>, sqlx::Error> {
        let query = format!(
            "UPDATE request_reviews SET
                review_status = $2,
                review_notes = COALESCE($3, review_notes),
                decided_at = CASE
                    WHEN $2 IN ('approved', 'rejected', 'changes_requested') THEN now()
                    ELSE decided_at
                END
             WHERE id = $1 AND review_status IN ('pending', 'in_progress')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RequestReview>(&query)
            .bind(id)
            .bind(status)
            .bind(notes)
            .fetch_optional(executor)
            .await
    }

    /// Cancel (remove) every unresolved review of a request. Used when a
    /// short-circuit decision resolves the request and when an edit
    /// withdraws it from review.
    pub async fn delete_unresolved_for_request(
        executor: impl PgExecutor<'_>,
        request_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM request_reviews
             WHERE request_id = $1 AND review_status IN ('pending', 'in_progress')",
        )
        .bind(request_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
