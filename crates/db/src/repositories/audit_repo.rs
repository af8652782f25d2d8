//! Repository for the `audit_logs` table. Insert and query only; audit
//! rows are never updated or deleted.

use sqlx::PgPool;

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

/// Column list for audit_logs queries.
const COLUMNS: &str = "id, user_id, action, entity_type, entity_id, details, created_at";

/// Provides append and query operations for the audit trail.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append a new audit entry.
    pub async fn create(pool: &PgPool, input: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs (user_id, action, entity_type, entity_id, details)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(input.user_id)
            .bind(&input.action)
            .bind(input.entity_type)
            .bind(input.entity_id)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    /// Query the trail with optional filters, newest first.
    pub async fn query(pool: &PgPool, params: &AuditQuery) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs
             WHERE ($1::bigint IS NULL OR user_id = $1)
               AND ($2::text IS NULL OR action = $2)
               AND ($3::text IS NULL OR entity_type = $3)
               AND ($4::bigint IS NULL OR entity_id = $4)
             ORDER BY created_at DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(params.user_id)
            .bind(&params.action)
            .bind(&params.entity_type)
            .bind(params.entity_id)
            .bind(params.limit.unwrap_or(100))
            .bind(params.offset.unwrap_or(0))
            .fetch_all(pool)
            .await
    }
}
