//! Repositories for the `datasets` and `dataset_reviewers` tables.

use sqlx::PgPool;

use dataport_core::types::DbId;

use crate::models::dataset::{
    CreateDataset, Dataset, DatasetReviewer, ReviewerAssignment, UpdateDataset,
};

/// Column list for datasets queries.
const DATASET_COLUMNS: &str = "id, name, description, category_id, \
    requires_period, requires_upi, requires_upi_list, requires_id_list, \
    has_admin_level, has_user_level, has_transaction_type, has_land_use, has_size_range, \
    requires_approval, auto_approve_roles, allows_recurring, \
    deactivated_at, created_at, updated_at";

/// Column list for dataset_reviewers queries.
const REVIEWER_COLUMNS: &str =
    "id, dataset_id, reviewer_user_id, review_level, review_order, created_at, updated_at";

/// Provides CRUD operations for datasets.
pub struct DatasetRepo;

impl DatasetRepo {
    /// Insert a new dataset, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateDataset) -> Result<Dataset, sqlx::Error> {
        let flags = input.criteria_flags;
        let query = format!(
            "INSERT INTO datasets
                (name, description, category_id,
                 requires_period, requires_upi, requires_upi_list, requires_id_list,
                 has_admin_level, has_user_level, has_transaction_type, has_land_use,
                 has_size_range, requires_approval, auto_approve_roles, allows_recurring)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {DATASET_COLUMNS}"
        );
        sqlx::query_as::<_, Dataset>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.category_id)
            .bind(flags.requires_period)
            .bind(flags.requires_upi)
            .bind(flags.requires_upi_list)
            .bind(flags.requires_id_list)
            .bind(flags.has_admin_level)
            .bind(flags.has_user_level)
            .bind(flags.has_transaction_type)
            .bind(flags.has_land_use)
            .bind(flags.has_size_range)
            .bind(input.requires_approval)
            .bind(&input.auto_approve_roles)
            .bind(input.allows_recurring)
            .fetch_one(pool)
            .await
    }

    /// Find a dataset by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Dataset>, sqlx::Error> {
        let query = format!("SELECT {DATASET_COLUMNS} FROM datasets WHERE id = $1");
        sqlx::query_as::<_, Dataset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List datasets, optionally including deactivated ones, newest first.
    pub async fn list(
        pool: &PgPool,
        include_deactivated: bool,
    ) -> Result<Vec<Dataset>, sqlx::Error> {
        let query = format!(
            "SELECT {DATASET_COLUMNS} FROM datasets
             WHERE $1 OR deactivated_at IS NULL
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Dataset>(&query)
            .bind(include_deactivated)
            .fetch_all(pool)
            .await
    }

    /// List active datasets in one category.
    pub async fn list_for_category(
        pool: &PgPool,
        category_id: DbId,
    ) -> Result<Vec<Dataset>, sqlx::Error> {
        let query = format!(
            "SELECT {DATASET_COLUMNS} FROM datasets
             WHERE category_id = $1 AND deactivated_at IS NULL
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, Dataset>(&query)
            .bind(category_id)
            .fetch_all(pool)
            .await
    }

    /// Update a dataset. Only non-`None` fields are applied; the criteria
    /// flags are replaced as a block when supplied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDataset,
    ) -> Result<Option<Dataset>, sqlx::Error> {
        let flags = input.criteria_flags;
        let query = format!(
            "UPDATE datasets SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category_id = COALESCE($4, category_id),
                requires_period = COALESCE($5, requires_period),
                requires_upi = COALESCE($6, requires_upi),
                requires_upi_list = COALESCE($7, requires_upi_list),
                requires_id_list = COALESCE($8, requires_id_list),
                has_admin_level = COALESCE($9, has_admin_level),
                has_user_level = COALESCE($10, has_user_level),
                has_transaction_type = COALESCE($11, has_transaction_type),
                has_land_use = COALESCE($12, has_land_use),
                has_size_range = COALESCE($13, has_size_range),
                requires_approval = COALESCE($14, requires_approval),
                auto_approve_roles = COALESCE($15, auto_approve_roles),
                allows_recurring = COALESCE($16, allows_recurring)
             WHERE id = $1
             RETURNING {DATASET_COLUMNS}"
        );
        sqlx::query_as::<_, Dataset>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.category_id)
            .bind(flags.map(|f| f.requires_period))
            .bind(flags.map(|f| f.requires_upi))
            .bind(flags.map(|f| f.requires_upi_list))
            .bind(flags.map(|f| f.requires_id_list))
            .bind(flags.map(|f| f.has_admin_level))
            .bind(flags.map(|f| f.has_user_level))
            .bind(flags.map(|f| f.has_transaction_type))
            .bind(flags.map(|f| f.has_land_use))
            .bind(flags.map(|f| f.has_size_range))
            .bind(input.requires_approval)
            .bind(&input.auto_approve_roles)
            .bind(input.allows_recurring)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate a dataset. Returns `true` if the row was updated.
    ///
    /// Datasets are never hard-deleted; existing requests keep referencing
    /// the deactivated row.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE datasets SET deactivated_at = now()
             WHERE id = $1 AND deactivated_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Provides operations for the configured reviewer assignments of a dataset.
pub struct DatasetReviewerRepo;

impl DatasetReviewerRepo {
    /// List a dataset's reviewer assignments, ordered by level then order.
    pub async fn list_for_dataset(
        pool: &PgPool,
        dataset_id: DbId,
    ) -> Result<Vec<DatasetReviewer>, sqlx::Error> {
        let query = format!(
            "SELECT {REVIEWER_COLUMNS} FROM dataset_reviewers
             WHERE dataset_id = $1
             ORDER BY review_level ASC, review_order ASC"
        );
        sqlx::query_as::<_, DatasetReviewer>(&query)
            .bind(dataset_id)
            .fetch_all(pool)
            .await
    }

    /// Replace a dataset's reviewer configuration atomically.
    pub async fn replace_for_dataset(
        pool: &PgPool,
        dataset_id: DbId,
        assignments: &[ReviewerAssignment],
    ) -> Result<Vec<DatasetReviewer>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM dataset_reviewers WHERE dataset_id = $1")
            .bind(dataset_id)
            .execute(&mut *tx)
            .await?;

        let insert = format!(
            "INSERT INTO dataset_reviewers
                (dataset_id, reviewer_user_id, review_level, review_order)
             VALUES ($1, $2, $3, $4)
             RETURNING {REVIEWER_COLUMNS}"
        );
        let mut created = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let row = sqlx::query_as::<_, DatasetReviewer>(&insert)
                .bind(dataset_id)
                .bind(assignment.reviewer_user_id)
                .bind(assignment.review_level)
                .bind(assignment.review_order)
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(created)
    }
}
