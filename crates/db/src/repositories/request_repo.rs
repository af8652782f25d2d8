//! Repositories for the `access_requests` and `request_datasets` tables.
//!
//! Functions take `impl PgExecutor` rather than `&PgPool` so the submission
//! and review-decision flows can run several steps inside one transaction.

use sqlx::PgExecutor;

use dataport_core::types::{DbId, Timestamp};

use crate::models::request::{AccessRequest, RequestDataset, RequestFilter};

/// Column list for access_requests queries.
const REQUEST_COLUMNS: &str = "id, request_number, title, description, priority, user_id, \
    status, submitted_at, resolved_at, created_at, updated_at";

/// Column list for request_datasets queries.
const DATASET_COLUMNS: &str =
    "id, request_id, dataset_id, criteria, created_at, updated_at";

/// Provides CRUD and state-transition operations for access requests.
pub struct RequestRepo;

impl RequestRepo {
    /// Insert a new request, returning the created row.
    ///
    /// The human-readable request number (`REQ-<year>-<seq>`) is generated
    /// from a database sequence so it is unique across concurrent inserts.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        title: &str,
        description: &str,
        priority: &str,
        status: &str,
    ) -> Result<AccessRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO access_requests (request_number, title, description, priority, user_id, status)
             VALUES (
                'REQ-' || to_char(now(), 'YYYY') || '-' ||
                    lpad(nextval('request_number_seq')::text, 6, '0'),
                $1, $2, $3, $4, $5
             )
             RETURNING {REQUEST_COLUMNS}"
        );
        sqlx::query_as::<_, AccessRequest>(&query)
            .bind(title)
            .bind(description)
            .bind(priority)
            .bind(user_id)
            .bind(status)
            .fetch_one(executor)
            .await
    }

    /// Find a request by ID.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<AccessRequest>, sqlx::Error> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM access_requests WHERE id = $1");
        sqlx::query_as::<_, AccessRequest>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a request by ID with a row lock, for transition flows.
    ///
    /// Serializes concurrent submissions and review decisions against the
    /// same request.
    pub async fn find_by_id_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<AccessRequest>, sqlx::Error> {
        let query =
            format!("SELECT {REQUEST_COLUMNS} FROM access_requests WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, AccessRequest>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List requests owned by one user, newest first.
    pub async fn list_for_user(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        filter: &RequestFilter,
    ) -> Result<Vec<AccessRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM access_requests
             WHERE user_id = $1
               AND ($2::text IS NULL OR status = $2)
               AND ($3::text IS NULL OR priority = $3)
             ORDER BY created_at DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, AccessRequest>(&query)
            .bind(user_id)
            .bind(&filter.status)
            .bind(&filter.priority)
            .bind(filter.limit.unwrap_or(50))
            .bind(filter.offset.unwrap_or(0))
            .fetch_all(executor)
            .await
    }

    /// List all requests, newest first. For elevated viewers.
    pub async fn list_all(
        executor: impl PgExecutor<'_>,
        filter: &RequestFilter,
    ) -> Result<Vec<AccessRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM access_requests
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::text IS NULL OR priority = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, AccessRequest>(&query)
            .bind(&filter.status)
            .bind(&filter.priority)
            .bind(filter.limit.unwrap_or(50))
            .bind(filter.offset.unwrap_or(0))
            .fetch_all(executor)
            .await
    }

    /// Update the editable content fields. Only non-`None` values apply.
    pub async fn update_fields(
        executor: impl PgExecutor<'_>,
        id: DbId,
        title: Option<&str>,
        description: Option<&str>,
        priority: Option<&str>,
    ) -> Result<Option<AccessRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE access_requests SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                priority = COALESCE($4, priority)
             WHERE id = $1
             RETURNING {REQUEST_COLUMNS}"
        );
        sqlx::query_as::<_, AccessRequest>(&query)
            .bind(id)
            .bind(title)
            .bind(description)
            .bind(priority)
            .fetch_optional(executor)
            .await
    }

    /// Guarded status transition: applies only if the row is still in
    /// `from`, making submission idempotent under concurrent calls.
    ///
    /// Stamps `submitted_at` when entering `pending` and `resolved_at` when
    /// entering a resolved status; reopening clears `resolved_at`.
    ///
    /// Returns `None` if the row does not exist or is no longer in `from`.
    pub async fn transition(
        executor: impl PgExecutor<'_>,
        id: DbId,
        from: &str,
        to: &str,
    ) -> Result<Option<AccessRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE access_requests SET
                status = $3,
                submitted_at = CASE WHEN $3 = 'pending' THEN now() ELSE submitted_at END,
                resolved_at = CASE
                    WHEN $3 IN ('approved', 'rejected', 'changes_requested') THEN now()
                    ELSE NULL
                END
             WHERE id = $1 AND status = $2
             RETURNING {REQUEST_COLUMNS}"
        );
        sqlx::query_as::<_, AccessRequest>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(executor)
            .await
    }

    /// Delete a request (cascades to its dataset selections and reviews).
    ///
    /// Returns `true` if the row was deleted. Eligibility (ownership, state,
    /// no resolved reviews) is checked by the caller before this point.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM access_requests WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete draft requests untouched since `cutoff`, returning how many
    /// rows were reaped. Used by the abandoned-draft background job.
    pub async fn delete_stale_drafts(
        executor: impl PgExecutor<'_>,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM access_requests WHERE status = 'draft' AND updated_at < $1",
        )
        .bind(cutoff)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Request counts grouped by status, for the analytics summary.
    pub async fn count_by_status(
        executor: impl PgExecutor<'_>,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM access_requests GROUP BY status ORDER BY status",
        )
        .fetch_all(executor)
        .await
    }
}

/// Provides operations for a request's dataset selections.
pub struct RequestDatasetRepo;

impl RequestDatasetRepo {
    /// Insert one dataset selection.
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        request_id: DbId,
        dataset_id: DbId,
        criteria: &serde_json::Value,
    ) -> Result<RequestDataset, sqlx::Error> {
        let query = format!(
            "INSERT INTO request_datasets (request_id, dataset_id, criteria)
             VALUES ($1, $2, $3)
             RETURNING {DATASET_COLUMNS}"
        );
        sqlx::query_as::<_, RequestDataset>(&query)
            .bind(request_id)
            .bind(dataset_id)
            .bind(criteria)
            .fetch_one(executor)
            .await
    }

    /// List a request's dataset selections in insertion order.
    pub async fn list_for_request(
        executor: impl PgExecutor<'_>,
        request_id: DbId,
    ) -> Result<Vec<RequestDataset>, sqlx::Error> {
        let query = format!(
            "SELECT {DATASET_COLUMNS} FROM request_datasets
             WHERE request_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, RequestDataset>(&query)
            .bind(request_id)
            .fetch_all(executor)
            .await
    }

    /// Update the criteria payload of one selection.
    pub async fn update_criteria(
        executor: impl PgExecutor<'_>,
        id: DbId,
        criteria: &serde_json::Value,
    ) -> Result<Option<RequestDataset>, sqlx::Error> {
        let query = format!(
            "UPDATE request_datasets SET criteria = $2
             WHERE id = $1
             RETURNING {DATASET_COLUMNS}"
        );
        sqlx::query_as::<_, RequestDataset>(&query)
            .bind(id)
            .bind(criteria)
            .fetch_optional(executor)
            .await
    }

    /// Delete one selection (cascades to its reviews).
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM request_datasets WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
