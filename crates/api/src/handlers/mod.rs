//! HTTP handlers, one module per concern.

pub mod admin;
pub mod analytics;
pub mod audit;
pub mod auth;
pub mod categories;
pub mod datasets;
pub mod requests;
pub mod reviews;

use dataport_db::models::audit::CreateAuditLog;
use dataport_db::repositories::AuditLogRepo;
use dataport_db::DbPool;

/// Append an audit entry, logging instead of failing the request if the
/// write itself fails. Audit is best-effort; the primary operation has
/// already committed by the time this runs.
pub(crate) async fn record_audit(pool: &DbPool, entry: CreateAuditLog) {
    if let Err(e) = AuditLogRepo::create(pool, &entry).await {
        tracing::error!(error = %e, action = %entry.action, "Failed to write audit entry");
    }
}
