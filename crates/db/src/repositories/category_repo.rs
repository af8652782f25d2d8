//! Repository for the `dataset_categories` table.

use sqlx::PgPool;

use dataport_core::types::DbId;

use crate::models::dataset::{CreateCategory, DatasetCategory, UpdateCategory};

/// Column list for dataset_categories queries.
const COLUMNS: &str = "id, name, icon, description, created_at, updated_at";

/// Provides CRUD operations for dataset categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a new category, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCategory,
    ) -> Result<DatasetCategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO dataset_categories (name, icon, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DatasetCategory>(&query)
            .bind(&input.name)
            .bind(&input.icon)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Find a category by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DatasetCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dataset_categories WHERE id = $1");
        sqlx::query_as::<_, DatasetCategory>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all categories ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<DatasetCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dataset_categories ORDER BY name ASC");
        sqlx::query_as::<_, DatasetCategory>(&query)
            .fetch_all(pool)
            .await
    }

    /// Update a category. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<DatasetCategory>, sqlx::Error> {
        let query = format!(
            "UPDATE dataset_categories SET
                name = COALESCE($2, name),
                icon = COALESCE($3, icon),
                description = COALESCE($4, description)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DatasetCategory>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.icon)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a category. Member datasets fall back to uncategorized via
    /// the `ON DELETE SET NULL` foreign key.
    ///
    /// Returns `true` if the row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dataset_categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
