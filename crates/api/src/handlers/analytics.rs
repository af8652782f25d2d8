//! Handler for the analytics summary.
//!
//! Criteria usage is computed from the same flag-to-field table the schema
//! endpoint uses, so what the summary counts can never drift from what the
//! form asks for.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use dataport_core::criteria::schema::CRITERIA_TABLE;
use dataport_core::permissions::Action;
use dataport_db::repositories::{DatasetRepo, RequestRepo};

use crate::error::AppResult;
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// How many datasets declare one criteria field.
#[derive(Debug, Serialize)]
pub struct CriteriaUsage {
    pub key: &'static str,
    pub label: &'static str,
    pub dataset_count: usize,
}

/// The analytics summary payload.
#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    /// Request counts keyed by status.
    pub requests_by_status: BTreeMap<String, i64>,
    /// Per-criteria dataset counts, in schema table order.
    pub criteria_usage: Vec<CriteriaUsage>,
    pub total_datasets: usize,
    pub active_datasets: usize,
}

/// GET /api/v1/analytics/summary
///
/// Requires the view-analytics permission.
pub async fn summary(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ViewAnalytics)?;

    let requests_by_status: BTreeMap<String, i64> = RequestRepo::count_by_status(&state.pool)
        .await?
        .into_iter()
        .collect();

    let datasets = DatasetRepo::list(&state.pool, true).await?;
    let active_datasets = datasets.iter().filter(|d| d.is_active()).count();

    let criteria_usage = CRITERIA_TABLE
        .iter()
        .map(|(flag, field)| CriteriaUsage {
            key: field.key,
            label: field.label,
            dataset_count: datasets
                .iter()
                .filter(|d| flag.is_set(&d.criteria_flags()))
                .count(),
        })
        .collect();

    Ok(Json(DataResponse {
        data: AnalyticsSummary {
            requests_by_status,
            criteria_usage,
            total_datasets: datasets.len(),
            active_datasets,
        },
    }))
}
