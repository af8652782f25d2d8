//! Repository for the `users` table.

use sqlx::PgPool;

use dataport_core::types::DbId;

use crate::models::user::{CreateUser, UpdateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, password_hash, role, organization, position, \
    can_view_all_requests, can_approve_requests, can_manage_users, can_view_audit_trail, \
    can_export_data, can_configure_datasets, can_view_analytics, is_reviewer, \
    is_active, last_login_at, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users
                (name, email, password_hash, role, organization, position,
                 can_view_all_requests, can_approve_requests, can_manage_users,
                 can_view_audit_trail, can_export_data, can_configure_datasets,
                 can_view_analytics, is_reviewer)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.role)
            .bind(&input.organization)
            .bind(&input.position)
            .bind(input.permissions.can_view_all_requests)
            .bind(input.permissions.can_approve_requests)
            .bind(input.permissions.can_manage_users)
            .bind(input.permissions.can_view_audit_trail)
            .bind(input.permissions.can_export_data)
            .bind(input.permissions.can_configure_datasets)
            .bind(input.permissions.can_view_analytics)
            .bind(input.permissions.is_reviewer)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// List all users ordered by most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY created_at DESC");
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// Update a user. Only non-`None` fields in `input` are applied; the
    /// permission flags are replaced as a block when supplied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let perms = input.permissions;
        let query = format!(
            "UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                organization = COALESCE($5, organization),
                position = COALESCE($6, position),
                is_active = COALESCE($7, is_active),
                can_view_all_requests = COALESCE($8, can_view_all_requests),
                can_approve_requests = COALESCE($9, can_approve_requests),
                can_manage_users = COALESCE($10, can_manage_users),
                can_view_audit_trail = COALESCE($11, can_view_audit_trail),
                can_export_data = COALESCE($12, can_export_data),
                can_configure_datasets = COALESCE($13, can_configure_datasets),
                can_view_analytics = COALESCE($14, can_view_analytics),
                is_reviewer = COALESCE($15, is_reviewer)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.role)
            .bind(&input.organization)
            .bind(&input.position)
            .bind(input.is_active)
            .bind(perms.map(|p| p.can_view_all_requests))
            .bind(perms.map(|p| p.can_approve_requests))
            .bind(perms.map(|p| p.can_manage_users))
            .bind(perms.map(|p| p.can_view_audit_trail))
            .bind(perms.map(|p| p.can_export_data))
            .bind(perms.map(|p| p.can_configure_datasets))
            .bind(perms.map(|p| p.can_view_analytics))
            .bind(perms.map(|p| p.is_reviewer))
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate a user by setting `is_active = false`.
    ///
    /// Returns `true` if the row was updated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_active = false WHERE id = $1 AND is_active = true")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp a successful login.
    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
