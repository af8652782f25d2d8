//! Handlers for dataset category management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use dataport_core::audit::{
    ACTION_CATEGORY_CREATE, ACTION_CATEGORY_DELETE, ACTION_CATEGORY_UPDATE, ENTITY_CATEGORY,
};
use dataport_core::error::CoreError;
use dataport_core::permissions::Action;
use dataport_core::types::DbId;
use dataport_db::models::audit::CreateAuditLog;
use dataport_db::models::dataset::{CreateCategory, UpdateCategory};
use dataport_db::repositories::CategoryRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/categories
pub async fn list_categories(
    _current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let categories = CategoryRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// POST /api/v1/categories
pub async fn create_category(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ConfigureDatasets)?;

    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Category name must not be empty".into(),
        )));
    }

    let category = CategoryRepo::create(&state.pool, &input).await?;

    tracing::info!(
        user_id = current.id(),
        category_id = category.id,
        name = %category.name,
        "Category created"
    );
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_CATEGORY_CREATE.to_string(),
            entity_type: Some(ENTITY_CATEGORY),
            entity_id: Some(category.id),
            details: None,
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PATCH /api/v1/categories/{category_id}
pub async fn update_category(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ConfigureDatasets)?;

    let category = CategoryRepo::update(&state.pool, category_id, &input)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Category",
                id: category_id,
            })
        })?;

    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_CATEGORY_UPDATE.to_string(),
            entity_type: Some(ENTITY_CATEGORY),
            entity_id: Some(category.id),
            details: None,
        },
    )
    .await;

    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/categories/{category_id}
///
/// Member datasets fall back to uncategorized.
pub async fn delete_category(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ConfigureDatasets)?;

    let deleted = CategoryRepo::delete(&state.pool, category_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id: category_id,
        }));
    }

    tracing::info!(user_id = current.id(), category_id, "Category deleted");
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_CATEGORY_DELETE.to_string(),
            entity_type: Some(ENTITY_CATEGORY),
            entity_id: Some(category_id),
            details: None,
        },
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
