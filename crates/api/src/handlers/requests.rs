//! Handlers for the access-request lifecycle: create, edit, submit,
//! delete, and listing.
//!
//! Submission is the only path into review: it validates criteria
//! completeness, applies the auto-approval bypass, and materializes
//! reviewer assignments from the selected datasets' configured reviewer
//! lists. All state transitions run inside one transaction with a guarded
//! status-conditional update, so a concurrent double submit gets a 409
//! instead of duplicated reviews.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use dataport_core::audit::{
    ACTION_REQUEST_CREATE, ACTION_REQUEST_DELETE, ACTION_REQUEST_SUBMIT, ACTION_REQUEST_UPDATE,
    ENTITY_REQUEST,
};
use dataport_core::criteria::schema::criteria_schema;
use dataport_core::criteria::values::validate_criteria_values;
use dataport_core::error::CoreError;
use dataport_core::permissions::{
    can_delete_request, can_edit_request, can_view_request, Action,
};
use dataport_core::types::DbId;
use dataport_core::workflow::request::{
    auto_approved, validate_request_fields, Priority, RequestStatus,
};
use dataport_db::models::audit::CreateAuditLog;
use dataport_db::models::dataset::Dataset;
use dataport_db::models::request::{
    AccessRequest, CreateRequest, DatasetSelection, RequestDataset, RequestFilter, UpdateRequest,
};
use dataport_db::models::review::{CreateReview, RequestReview};
use dataport_db::repositories::{
    DatasetRepo, DatasetReviewerRepo, RequestDatasetRepo, RequestRepo, ReviewRepo,
};
use dataport_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::handlers::datasets::criteria_validation_error;
use crate::handlers::record_audit;
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Full request detail: the request, its dataset selections, and its
/// review rows.
#[derive(Debug, Serialize)]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: AccessRequest,
    pub datasets: Vec<RequestDataset>,
    pub reviews: Vec<RequestReview>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a request or fail with 404.
async fn ensure_request_exists(pool: &DbPool, id: DbId) -> Result<AccessRequest, AppError> {
    RequestRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Request",
                id,
            })
        })
}

/// Validate one dataset selection against the dataset's derived schema.
///
/// `enforce_complete` requires every required criteria field to be filled
/// (submission); otherwise only type mismatches and unknown keys fail
/// (drafts may be incomplete).
async fn validate_selection(
    pool: &DbPool,
    selection: &DatasetSelection,
    enforce_complete: bool,
) -> Result<Dataset, AppError> {
    let dataset = DatasetRepo::find_by_id(pool, selection.dataset_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Dataset",
                id: selection.dataset_id,
            })
        })?;
    if !dataset.is_active() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Dataset '{}' is deactivated",
            dataset.name
        ))));
    }

    let schema = criteria_schema(&dataset.criteria_flags());
    let validation = validate_criteria_values(&schema, &selection.criteria);
    let acceptable = if enforce_complete {
        validation.is_valid()
    } else {
        validation.invalid_keys.is_empty()
    };
    if !acceptable {
        return Err(criteria_validation_error(&validation));
    }

    Ok(dataset)
}

/// Parse an optional priority string, defaulting to `normal`.
fn parse_priority(priority: Option<&str>) -> Result<Priority, AppError> {
    match priority {
        Some(p) => Priority::from_str_db(p).map_err(AppError::Core),
        None => Ok(Priority::default()),
    }
}

/// Reviewer assignments for the selected datasets, keyed by dataset id.
async fn load_assignments(
    pool: &DbPool,
    datasets: &[Dataset],
) -> Result<HashMap<DbId, Vec<(DbId, i32, i32)>>, AppError> {
    let mut by_dataset = HashMap::new();
    for dataset in datasets {
        let reviewers = DatasetReviewerRepo::list_for_dataset(pool, dataset.id).await?;
        by_dataset.insert(
            dataset.id,
            reviewers
                .into_iter()
                .map(|r| (r.reviewer_user_id, r.review_level, r.review_order))
                .collect(),
        );
    }
    Ok(by_dataset)
}

/// Drive a pending request into review (or straight to approved).
///
/// Runs inside the caller's transaction, after the guarded
/// `draft -> pending` transition has succeeded. `selections` are the
/// request's stored dataset rows; `datasets` the matching dataset rows;
/// `assignments` the configured reviewers per dataset.
///
/// Returns the request in its final post-submission state: `approved` when
/// every dataset bypasses review for the owner's role, `in_review` when
/// reviewer rows were created, and `pending` when approval is required but
/// no reviewers are configured yet.
async fn advance_submission(
    conn: &mut sqlx::PgConnection,
    request: AccessRequest,
    owner_role: &str,
    selections: &[RequestDataset],
    datasets: &HashMap<DbId, Dataset>,
    assignments: &HashMap<DbId, Vec<(DbId, i32, i32)>>,
) -> Result<AccessRequest, AppError> {
    let policies: Vec<_> = selections
        .iter()
        .filter_map(|s| datasets.get(&s.dataset_id))
        .map(|d| d.approval_policy())
        .collect();

    if auto_approved(owner_role, &policies) {
        let approved = RequestRepo::transition(&mut *conn, request.id, "pending", "approved")
            .await?
            .ok_or_else(|| {
                AppError::InternalError("Request left pending state mid-submission".into())
            })?;
        tracing::info!(request_id = approved.id, "Request auto-approved");
        return Ok(approved);
    }

    let mut created = 0usize;
    for selection in selections {
        let Some(dataset) = datasets.get(&selection.dataset_id) else {
            continue;
        };
        // Datasets the owner's role bypasses still go to review when the
        // request as a whole does not bypass; their reviewers gate them.
        let Some(reviewers) = assignments.get(&dataset.id) else {
            continue;
        };
        for (reviewer_user_id, review_level, review_order) in reviewers {
            ReviewRepo::create(
                &mut *conn,
                &CreateReview {
                    request_id: request.id,
                    request_dataset_id: Some(selection.id),
                    reviewer_user_id: *reviewer_user_id,
                    review_level: *review_level,
                    review_order: *review_order,
                },
            )
            .await?;
            created += 1;
        }
    }

    if created == 0 {
        // Approval is required but no reviewers are configured yet: the
        // request rests in pending until an administrator assigns some and
        // the owner resubmits.
        tracing::warn!(
            request_id = request.id,
            "Request requires approval but no reviewers are configured; staying pending"
        );
        return Ok(request);
    }

    let in_review = RequestRepo::transition(&mut *conn, request.id, "pending", "in_review")
        .await?
        .ok_or_else(|| {
            AppError::InternalError("Request left pending state mid-submission".into())
        })?;
    tracing::info!(
        request_id = in_review.id,
        review_count = created,
        "Request entered review"
    );
    Ok(in_review)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/requests
///
/// The caller's own requests, or every request for users with the
/// view-all permission.
pub async fn list_requests(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<RequestFilter>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = &filter.status {
        RequestStatus::from_str_db(status).map_err(AppError::Core)?;
    }
    if let Some(priority) = &filter.priority {
        Priority::from_str_db(priority).map_err(AppError::Core)?;
    }

    let requests = if current.allows(Action::ViewAllRequests) {
        RequestRepo::list_all(&state.pool, &filter).await?
    } else {
        RequestRepo::list_for_user(&state.pool, current.id(), &filter).await?
    };
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/requests/{request_id}
///
/// Visible to the owner and to users with the view-all permission.
pub async fn get_request(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = ensure_request_exists(&state.pool, request_id).await?;

    if !can_view_request(current.id(), &current.permissions(), request.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You may only view your own requests".into(),
        )));
    }

    let datasets = RequestDatasetRepo::list_for_request(&state.pool, request_id).await?;
    let reviews = ReviewRepo::list_for_request(&state.pool, request_id).await?;

    Ok(Json(DataResponse {
        data: RequestDetail {
            request,
            datasets,
            reviews,
        },
    }))
}

/// POST /api/v1/requests
///
/// Create a request. With `save_as_draft` the criteria may be incomplete
/// and the request rests in `draft`; otherwise it is validated and
/// submitted in the same operation.
pub async fn create_request(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<CreateRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request_fields(&input.title, &input.description).map_err(AppError::Core)?;
    let priority = parse_priority(input.priority.as_deref())?;

    if input.datasets.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "At least one dataset must be selected".into(),
        )));
    }
    let mut seen = std::collections::HashSet::new();
    for selection in &input.datasets {
        if !seen.insert(selection.dataset_id) {
            return Err(AppError::Core(CoreError::Validation(
                "A dataset may only be selected once per request".into(),
            )));
        }
    }

    let mut datasets = HashMap::new();
    for selection in &input.datasets {
        let dataset = validate_selection(&state.pool, selection, !input.save_as_draft).await?;
        datasets.insert(dataset.id, dataset);
    }
    let assignments = load_assignments(&state.pool, &datasets.values().cloned().collect::<Vec<_>>())
        .await?;

    let mut tx = state.pool.begin().await?;

    let request = RequestRepo::create(
        &mut *tx,
        current.id(),
        input.title.trim(),
        input.description.trim(),
        priority.as_str(),
        RequestStatus::Draft.as_str(),
    )
    .await?;

    let mut selections = Vec::with_capacity(input.datasets.len());
    for selection in &input.datasets {
        let criteria = serde_json::to_value(&selection.criteria)
            .map_err(|e| AppError::InternalError(format!("Criteria serialization failed: {e}")))?;
        let row = RequestDatasetRepo::insert(
            &mut *tx,
            request.id,
            selection.dataset_id,
            &criteria,
        )
        .await?;
        selections.push(row);
    }

    let request = if input.save_as_draft {
        request
    } else {
        let pending = RequestRepo::transition(&mut *tx, request.id, "draft", "pending")
            .await?
            .ok_or_else(|| {
                AppError::InternalError("Freshly created request was not a draft".into())
            })?;
        advance_submission(
            &mut tx,
            pending,
            &current.user.role,
            &selections,
            &datasets,
            &assignments,
        )
        .await?
    };

    tx.commit().await?;

    tracing::info!(
        user_id = current.id(),
        request_id = request.id,
        request_number = %request.request_number,
        status = %request.status,
        "Request created"
    );
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_REQUEST_CREATE.to_string(),
            entity_type: Some(ENTITY_REQUEST),
            entity_id: Some(request.id),
            details: Some(serde_json::json!({ "status": request.status })),
        },
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: RequestDetail {
                request,
                datasets: selections,
                reviews: vec![],
            },
        }),
    ))
}

/// PATCH /api/v1/requests/{request_id}
///
/// Edit a request's content. Only the owner, and only in an editable
/// status. Editing a rejected or changes-requested request reopens it as a
/// draft for resubmission. Replacing the dataset selections cancels
/// reviews tied to removed datasets.
pub async fn update_request(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
    Json(input): Json<UpdateRequest>,
) -> AppResult<impl IntoResponse> {
    let request = ensure_request_exists(&state.pool, request_id).await?;
    let status = request.status().map_err(AppError::Core)?;

    if !can_edit_request(current.id(), request.user_id, status) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Request is not editable by you in its current state".into(),
        )));
    }

    if let Some(title) = &input.title {
        validate_request_fields(title, input.description.as_deref().unwrap_or(&request.description))
            .map_err(AppError::Core)?;
    } else if let Some(description) = &input.description {
        validate_request_fields(&request.title, description).map_err(AppError::Core)?;
    }
    if let Some(priority) = &input.priority {
        Priority::from_str_db(priority).map_err(AppError::Core)?;
    }

    // Pending requests must stay complete; drafts and reopened requests
    // may hold partial criteria until resubmission.
    let enforce_complete = status == RequestStatus::Pending;
    let mut new_datasets = HashMap::new();
    if let Some(selections) = &input.datasets {
        if selections.is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "At least one dataset must be selected".into(),
            )));
        }
        for selection in selections {
            let dataset = validate_selection(&state.pool, selection, enforce_complete).await?;
            new_datasets.insert(dataset.id, selection);
        }
    }

    let mut tx = state.pool.begin().await?;

    let mut updated = RequestRepo::update_fields(
        &mut *tx,
        request_id,
        input.title.as_deref().map(str::trim),
        input.description.as_deref().map(str::trim),
        input.priority.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Request",
            id: request_id,
        })
    })?;

    if input.datasets.is_some() {
        let existing = RequestDatasetRepo::list_for_request(&mut *tx, request_id).await?;

        // Remove deselected datasets; their reviews go with them.
        for row in &existing {
            if !new_datasets.contains_key(&row.dataset_id) {
                RequestDatasetRepo::delete(&mut *tx, row.id).await?;
            }
        }
        // Update kept selections, insert new ones.
        for (dataset_id, selection) in &new_datasets {
            let criteria = serde_json::to_value(&selection.criteria).map_err(|e| {
                AppError::InternalError(format!("Criteria serialization failed: {e}"))
            })?;
            match existing.iter().find(|r| r.dataset_id == *dataset_id) {
                Some(row) => {
                    RequestDatasetRepo::update_criteria(&mut *tx, row.id, &criteria).await?;
                }
                None => {
                    RequestDatasetRepo::insert(&mut *tx, request_id, *dataset_id, &criteria)
                        .await?;
                }
            }
        }
    }

    // Editing a resolved-negative request reopens it for resubmission.
    if status.can_transition_to(RequestStatus::Draft) {
        ReviewRepo::delete_unresolved_for_request(&mut *tx, request_id).await?;
        updated = RequestRepo::transition(&mut *tx, request_id, status.as_str(), "draft")
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Conflict(
                    "Request changed state while being edited".into(),
                ))
            })?;
    }

    tx.commit().await?;

    let datasets = RequestDatasetRepo::list_for_request(&state.pool, request_id).await?;
    let reviews = ReviewRepo::list_for_request(&state.pool, request_id).await?;

    tracing::info!(
        user_id = current.id(),
        request_id,
        status = %updated.status,
        "Request updated"
    );
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_REQUEST_UPDATE.to_string(),
            entity_type: Some(ENTITY_REQUEST),
            entity_id: Some(request_id),
            details: None,
        },
    )
    .await;

    Ok(Json(DataResponse {
        data: RequestDetail {
            request: updated,
            datasets,
            reviews,
        },
    }))
}

/// POST /api/v1/requests/{request_id}/submit
///
/// Submit a draft for review. Validates criteria completeness, applies the
/// auto-approval bypass, and materializes reviewer assignments. A second
/// submission of the same request gets a 409.
pub async fn submit_request(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = ensure_request_exists(&state.pool, request_id).await?;

    if request.user_id != current.id() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner may submit a request".into(),
        )));
    }
    let status = request.status().map_err(AppError::Core)?;
    if status != RequestStatus::Draft {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Only draft requests can be submitted (current status: {})",
            request.status
        ))));
    }

    let selections = RequestDatasetRepo::list_for_request(&state.pool, request_id).await?;
    if selections.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "At least one dataset must be selected before submission".into(),
        )));
    }

    // Full completeness validation against the current dataset schemas.
    let mut datasets = HashMap::new();
    for row in &selections {
        let selection = DatasetSelection {
            dataset_id: row.dataset_id,
            criteria: row.criteria_values().map_err(AppError::Core)?,
        };
        let dataset = validate_selection(&state.pool, &selection, true).await?;
        datasets.insert(dataset.id, dataset);
    }
    let assignments = load_assignments(&state.pool, &datasets.values().cloned().collect::<Vec<_>>())
        .await?;

    let mut tx = state.pool.begin().await?;

    let pending = RequestRepo::transition(&mut *tx, request_id, "draft", "pending")
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Request has already been submitted".into(),
            ))
        })?;

    let request = advance_submission(
        &mut tx,
        pending,
        &current.user.role,
        &selections,
        &datasets,
        &assignments,
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        user_id = current.id(),
        request_id,
        status = %request.status,
        "Request submitted"
    );
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_REQUEST_SUBMIT.to_string(),
            entity_type: Some(ENTITY_REQUEST),
            entity_id: Some(request_id),
            details: Some(serde_json::json!({ "status": request.status })),
        },
    )
    .await;

    Ok(Json(DataResponse { data: request }))
}

/// DELETE /api/v1/requests/{request_id}
///
/// Remove a request abandoned before review: only the owner, only a draft
/// or a pending request with zero resolved reviews.
pub async fn delete_request(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = ensure_request_exists(&state.pool, request_id).await?;
    let status = request.status().map_err(AppError::Core)?;

    let resolved = ReviewRepo::count_resolved_for_request(&state.pool, request_id).await?;
    if !can_delete_request(current.id(), request.user_id, status, resolved as usize) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Request can no longer be deleted".into(),
        )));
    }

    RequestRepo::delete(&state.pool, request_id).await?;

    tracing::info!(user_id = current.id(), request_id, "Request deleted");
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_REQUEST_DELETE.to_string(),
            entity_type: Some(ENTITY_REQUEST),
            entity_id: Some(request_id),
            details: None,
        },
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
