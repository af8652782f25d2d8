//! Handlers for dataset configuration, criteria schema, preview, export,
//! and reviewer assignment.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use dataport_core::audit::{
    ACTION_DATASET_CREATE, ACTION_DATASET_DEACTIVATE, ACTION_DATASET_EXPORT,
    ACTION_DATASET_REVIEWERS_SET, ACTION_DATASET_UPDATE, ENTITY_DATASET,
};
use dataport_core::criteria::admin_level::AdminLevelSelection;
use dataport_core::criteria::schema::{criteria_schema, CriteriaField, KEY_ADMIN_LEVEL};
use dataport_core::criteria::values::{
    criteria_fingerprint, validate_criteria_values, CriteriaValidation, CriteriaValues,
};
use dataport_core::error::CoreError;
use dataport_core::permissions::Action;
use dataport_core::roles::validate_role;
use dataport_core::types::DbId;
use dataport_db::models::audit::CreateAuditLog;
use dataport_db::models::dataset::{
    CreateDataset, Dataset, ReviewerAssignment, UpdateDataset,
};
use dataport_db::repositories::{DatasetRepo, DatasetReviewerRepo, UserRepo};
use dataport_db::DbPool;
use dataport_query::{ExportResult, PreviewResult};

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for the dataset list.
#[derive(Debug, Deserialize)]
pub struct ListDatasetsParams {
    #[serde(default)]
    pub include_deactivated: bool,
    pub category_id: Option<DbId>,
}

/// One schema entry enriched with its option values, where fixed.
#[derive(Debug, Serialize)]
pub struct SchemaEntry {
    #[serde(flatten)]
    pub field: CriteriaField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<&'static [&'static str]>,
}

/// Request body for preview and export.
///
/// Clients may send the administrative filter either as a plain
/// `admin_level` multi-select in `criteria`, or as the full tiered
/// selection in `admin_levels`; the latter wins and is collapsed to its
/// narrowest tier server-side.
#[derive(Debug, Deserialize)]
pub struct QueryBody {
    #[serde(default)]
    pub criteria: CriteriaValues,
    pub admin_levels: Option<AdminLevelSelection>,
}

impl QueryBody {
    /// The effective criteria values, with the tiered administrative
    /// selection collapsed in.
    fn into_criteria(self) -> CriteriaValues {
        let mut criteria = self.criteria;
        if let Some(selection) = self.admin_levels {
            criteria.insert(KEY_ADMIN_LEVEL.to_string(), selection.to_criteria_value());
        }
        criteria
    }
}

/// Preview result plus the fingerprint of the criteria that produced it.
///
/// Clients compare the fingerprint against their current criteria and drop
/// the preview as stale on mismatch.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    #[serde(flatten)]
    pub result: PreviewResult,
    pub criteria_fingerprint: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a dataset or fail with 404.
pub async fn ensure_dataset_exists(pool: &DbPool, id: DbId) -> Result<Dataset, AppError> {
    DatasetRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Dataset",
                id,
            })
        })
}

/// Turn a failed criteria validation into the error the caller sees.
pub fn criteria_validation_error(validation: &CriteriaValidation) -> AppError {
    let mut parts = Vec::new();
    if !validation.missing_keys.is_empty() {
        parts.push(format!(
            "missing required criteria: {}",
            validation.missing_keys.join(", ")
        ));
    }
    if !validation.invalid_keys.is_empty() {
        parts.push(format!(
            "invalid criteria: {}",
            validation.invalid_keys.join(", ")
        ));
    }
    AppError::Core(CoreError::Validation(format!(
        "Criteria incomplete: {}",
        parts.join("; ")
    )))
}

/// Validate roles named in an auto-approve list.
fn validate_auto_approve_roles(roles: &[String]) -> Result<(), AppError> {
    for role in roles {
        validate_role(role).map_err(AppError::Core)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dataset CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/datasets
///
/// List datasets. Deactivated datasets are only visible to users with the
/// configure-datasets permission.
pub async fn list_datasets(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListDatasetsParams>,
) -> AppResult<impl IntoResponse> {
    if params.include_deactivated {
        current.require(Action::ConfigureDatasets)?;
    }

    let datasets = match params.category_id {
        Some(category_id) => DatasetRepo::list_for_category(&state.pool, category_id).await?,
        None => DatasetRepo::list(&state.pool, params.include_deactivated).await?,
    };
    Ok(Json(DataResponse { data: datasets }))
}

/// GET /api/v1/datasets/{dataset_id}
pub async fn get_dataset(
    _current: CurrentUser,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let dataset = ensure_dataset_exists(&state.pool, dataset_id).await?;
    Ok(Json(DataResponse { data: dataset }))
}

/// POST /api/v1/datasets
///
/// Create a dataset. Requires the configure-datasets permission.
pub async fn create_dataset(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<CreateDataset>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ConfigureDatasets)?;

    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Dataset name must not be empty".into(),
        )));
    }
    validate_auto_approve_roles(&input.auto_approve_roles)?;

    let dataset = DatasetRepo::create(&state.pool, &input).await?;

    tracing::info!(
        user_id = current.id(),
        dataset_id = dataset.id,
        name = %dataset.name,
        "Dataset created"
    );
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_DATASET_CREATE.to_string(),
            entity_type: Some(ENTITY_DATASET),
            entity_id: Some(dataset.id),
            details: None,
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: dataset })))
}

/// PATCH /api/v1/datasets/{dataset_id}
pub async fn update_dataset(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
    Json(input): Json<UpdateDataset>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ConfigureDatasets)?;

    if let Some(roles) = &input.auto_approve_roles {
        validate_auto_approve_roles(roles)?;
    }

    let dataset = DatasetRepo::update(&state.pool, dataset_id, &input)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Dataset",
                id: dataset_id,
            })
        })?;

    tracing::info!(
        user_id = current.id(),
        dataset_id = dataset.id,
        "Dataset updated"
    );
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_DATASET_UPDATE.to_string(),
            entity_type: Some(ENTITY_DATASET),
            entity_id: Some(dataset.id),
            details: None,
        },
    )
    .await;

    Ok(Json(DataResponse { data: dataset }))
}

/// DELETE /api/v1/datasets/{dataset_id}
///
/// Soft-deactivate: the dataset stops accepting new requests but stays
/// referenced by existing ones.
pub async fn deactivate_dataset(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ConfigureDatasets)?;

    ensure_dataset_exists(&state.pool, dataset_id).await?;
    let deactivated = DatasetRepo::deactivate(&state.pool, dataset_id).await?;
    if !deactivated {
        return Err(AppError::Core(CoreError::Conflict(
            "Dataset is already deactivated".into(),
        )));
    }

    tracing::info!(user_id = current.id(), dataset_id, "Dataset deactivated");
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_DATASET_DEACTIVATE.to_string(),
            entity_type: Some(ENTITY_DATASET),
            entity_id: Some(dataset_id),
            details: None,
        },
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Criteria schema, preview, export
// ---------------------------------------------------------------------------

/// GET /api/v1/datasets/{dataset_id}/criteria-schema
///
/// The derived criteria schema for a dataset: a pure function of its
/// criteria flags, with fixed option lists embedded.
pub async fn get_criteria_schema(
    _current: CurrentUser,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let dataset = ensure_dataset_exists(&state.pool, dataset_id).await?;

    let entries: Vec<SchemaEntry> = criteria_schema(&dataset.criteria_flags())
        .into_iter()
        .map(|field| SchemaEntry {
            options: field.options_source.map(|s| s.options()),
            field,
        })
        .collect();

    Ok(Json(DataResponse { data: entries }))
}

/// POST /api/v1/datasets/{dataset_id}/preview
///
/// Validate the criteria and return a bounded sample from the query
/// backend. Incomplete criteria fail with 400 before any backend call; a
/// backend outage surfaces as 502 and is never retried here.
pub async fn preview_dataset(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
    Json(body): Json<QueryBody>,
) -> AppResult<impl IntoResponse> {
    let dataset = ensure_dataset_exists(&state.pool, dataset_id).await?;
    if !dataset.is_active() {
        return Err(AppError::Core(CoreError::Validation(
            "Dataset is deactivated".into(),
        )));
    }

    let criteria = body.into_criteria();
    let schema = criteria_schema(&dataset.criteria_flags());
    let validation = validate_criteria_values(&schema, &criteria);
    if !validation.is_valid() {
        return Err(criteria_validation_error(&validation));
    }

    let result = state.query.preview(&dataset.name, &criteria).await?;

    tracing::debug!(
        user_id = current.id(),
        dataset_id,
        total_rows = result.total_rows,
        "Preview produced"
    );

    Ok(Json(DataResponse {
        data: PreviewResponse {
            criteria_fingerprint: criteria_fingerprint(&criteria),
            result,
        },
    }))
}

/// POST /api/v1/datasets/{dataset_id}/export
///
/// Full extract for users with the export permission. Validation mirrors
/// the preview path.
pub async fn export_dataset(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
    Json(body): Json<QueryBody>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ExportData)?;

    let dataset = ensure_dataset_exists(&state.pool, dataset_id).await?;
    if !dataset.is_active() {
        return Err(AppError::Core(CoreError::Validation(
            "Dataset is deactivated".into(),
        )));
    }

    let criteria = body.into_criteria();
    let schema = criteria_schema(&dataset.criteria_flags());
    let validation = validate_criteria_values(&schema, &criteria);
    if !validation.is_valid() {
        return Err(criteria_validation_error(&validation));
    }

    let result: ExportResult = state.query.export(&dataset.name, &criteria).await?;

    tracing::info!(
        user_id = current.id(),
        dataset_id,
        total_rows = result.total_rows,
        "Dataset exported"
    );
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_DATASET_EXPORT.to_string(),
            entity_type: Some(ENTITY_DATASET),
            entity_id: Some(dataset_id),
            details: Some(serde_json::json!({ "total_rows": result.total_rows })),
        },
    )
    .await;

    Ok(Json(DataResponse { data: result }))
}

// ---------------------------------------------------------------------------
// Reviewer assignment configuration
// ---------------------------------------------------------------------------

/// GET /api/v1/datasets/{dataset_id}/reviewers
pub async fn list_reviewers(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ConfigureDatasets)?;

    ensure_dataset_exists(&state.pool, dataset_id).await?;
    let reviewers = DatasetReviewerRepo::list_for_dataset(&state.pool, dataset_id).await?;
    Ok(Json(DataResponse { data: reviewers }))
}

/// PUT /api/v1/datasets/{dataset_id}/reviewers
///
/// Replace the dataset's reviewer configuration. Every assigned user must
/// exist, be active, and carry the reviewer flag.
pub async fn set_reviewers(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
    Json(assignments): Json<Vec<ReviewerAssignment>>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ConfigureDatasets)?;

    ensure_dataset_exists(&state.pool, dataset_id).await?;

    for assignment in &assignments {
        if assignment.review_level < 1 || assignment.review_order < 1 {
            return Err(AppError::Core(CoreError::Validation(
                "review_level and review_order must be >= 1".into(),
            )));
        }
        let user = UserRepo::find_by_id(&state.pool, assignment.reviewer_user_id)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::NotFound {
                    entity: "User",
                    id: assignment.reviewer_user_id,
                })
            })?;
        if !user.is_active || !user.is_reviewer {
            return Err(AppError::Core(CoreError::Validation(format!(
                "User {} is not an active reviewer",
                user.id
            ))));
        }
    }

    let reviewers =
        DatasetReviewerRepo::replace_for_dataset(&state.pool, dataset_id, &assignments).await?;

    tracing::info!(
        user_id = current.id(),
        dataset_id,
        reviewer_count = reviewers.len(),
        "Dataset reviewers configured"
    );
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_DATASET_REVIEWERS_SET.to_string(),
            entity_type: Some(ENTITY_DATASET),
            entity_id: Some(dataset_id),
            details: Some(serde_json::json!({ "reviewer_count": reviewers.len() })),
        },
    )
    .await;

    Ok(Json(DataResponse { data: reviewers }))
}
