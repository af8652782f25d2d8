//! Handlers for user administration. Every endpoint requires the
//! manage-users permission.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use dataport_core::audit::{
    ACTION_USER_CREATE, ACTION_USER_DEACTIVATE, ACTION_USER_UPDATE, ENTITY_USER,
};
use dataport_core::error::CoreError;
use dataport_core::permissions::{Action, PermissionSet};
use dataport_core::roles::{validate_role, ROLE_ADMIN};
use dataport_core::types::DbId;
use dataport_db::models::audit::CreateAuditLog;
use dataport_db::models::user::{CreateUser, UpdateUser, UserResponse};
use dataport_db::repositories::{SessionRepo, UserRepo};

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub organization: Option<String>,
    pub position: Option<String>,
    /// Omitted: admins get every flag, other roles none.
    pub permissions: Option<PermissionSet>,
}

/// GET /api/v1/admin/users
pub async fn list_users(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ManageUsers)?;

    let users = UserRepo::list(&state.pool).await?;
    let users: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/v1/admin/users/{user_id}
pub async fn get_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ManageUsers)?;

    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })
        })?;
    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}

/// POST /api/v1/admin/users
///
/// Provision a user. Admin accounts default to every permission flag;
/// everyone else starts with none unless flags are given explicitly.
pub async fn create_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ManageUsers)?;

    validate_role(&input.role).map_err(AppError::Core)?;
    validate_password_strength(&input.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    if input.name.trim().is_empty() || input.email.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Name and email must not be empty".into(),
        )));
    }

    let permissions = input.permissions.unwrap_or_else(|| {
        if input.role == ROLE_ADMIN {
            PermissionSet::all()
        } else {
            PermissionSet::default()
        }
    });

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            password_hash,
            role: input.role,
            organization: input.organization,
            position: input.position,
            permissions,
        },
    )
    .await?;

    tracing::info!(
        admin_id = current.id(),
        user_id = user.id,
        role = %user.role,
        "User created"
    );
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_USER_CREATE.to_string(),
            entity_type: Some(ENTITY_USER),
            entity_id: Some(user.id),
            details: None,
        },
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(user),
        }),
    ))
}

/// PATCH /api/v1/admin/users/{user_id}
pub async fn update_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ManageUsers)?;

    if let Some(role) = &input.role {
        validate_role(role).map_err(AppError::Core)?;
    }

    let user = UserRepo::update(&state.pool, user_id, &input)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })
        })?;

    tracing::info!(admin_id = current.id(), user_id, "User updated");
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_USER_UPDATE.to_string(),
            entity_type: Some(ENTITY_USER),
            entity_id: Some(user_id),
            details: None,
        },
    )
    .await;

    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}

/// DELETE /api/v1/admin/users/{user_id}
///
/// Soft-deactivate the account and revoke its sessions.
pub async fn deactivate_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::ManageUsers)?;

    if user_id == current.id() {
        return Err(AppError::Core(CoreError::Validation(
            "You cannot deactivate your own account".into(),
        )));
    }

    let deactivated = UserRepo::deactivate(&state.pool, user_id).await?;
    if !deactivated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }));
    }
    SessionRepo::revoke_all_for_user(&state.pool, user_id).await?;

    tracing::info!(admin_id = current.id(), user_id, "User deactivated");
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_USER_DEACTIVATE.to_string(),
            entity_type: Some(ENTITY_USER),
            entity_id: Some(user_id),
            details: None,
        },
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
