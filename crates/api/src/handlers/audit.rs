//! Handler for querying the audit trail.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use dataport_core::permissions::Action;
use dataport_db::models::audit::AuditQuery;
use dataport_db::repositories::AuditLogRepo;

use crate::error::AppResult;
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/audit
///
/// Query the append-only audit trail. Requires the view-audit-trail
/// permission.
pub async fn query_audit_trail(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<AuditQuery>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ViewAuditTrail)?;

    let entries = AuditLogRepo::query(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: entries }))
}
