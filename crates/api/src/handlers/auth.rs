//! Handlers for login, token refresh, logout, and the current-user profile.
//!
//! Sessions are a pair of short-lived JWT access token and opaque refresh
//! token; the refresh token rotates on every use.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use dataport_core::audit::ACTION_AUTH_LOGIN;
use dataport_core::error::CoreError;
use dataport_db::models::audit::CreateAuditLog;
use dataport_db::models::user::UserResponse;
use dataport_db::repositories::{SessionRepo, UserRepo};

use crate::auth::jwt;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for refresh and logout.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair plus profile returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

/// POST /api/v1/auth/login
///
/// Verify credentials and issue a token pair. The same generic message is
/// returned for unknown email and wrong password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<TokenResponse>>> {
    let invalid =
        || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?
    {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let access_token = jwt::generate_access_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    let (refresh_plaintext, refresh_hash) = jwt::generate_refresh_token();
    let expires_at = chrono::Utc::now()
        + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);
    SessionRepo::create(&state.pool, user.id, &refresh_hash, expires_at).await?;

    UserRepo::record_login(&state.pool, user.id).await?;

    tracing::info!(user_id = user.id, "User logged in");
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(user.id),
            action: ACTION_AUTH_LOGIN.to_string(),
            entity_type: None,
            entity_id: None,
            details: None,
        },
    )
    .await;

    Ok(Json(DataResponse {
        data: TokenResponse {
            access_token,
            refresh_token: refresh_plaintext,
            user: user.into(),
        },
    }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a live refresh token for a fresh token pair. The used token is
/// revoked (rotation) so a replayed token fails.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<TokenResponse>>> {
    let hash = jwt::hash_refresh_token(&input.refresh_token);

    let stored = SessionRepo::find_by_hash(&state.pool, &hash)
        .await?
        .filter(|t| t.is_valid_at(chrono::Utc::now()))
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    let user = UserRepo::find_by_id(&state.pool, stored.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    SessionRepo::revoke(&state.pool, &hash).await?;

    let access_token = jwt::generate_access_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    let (refresh_plaintext, refresh_hash) = jwt::generate_refresh_token();
    let expires_at = chrono::Utc::now()
        + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);
    SessionRepo::create(&state.pool, user.id, &refresh_hash, expires_at).await?;

    Ok(Json(DataResponse {
        data: TokenResponse {
            access_token,
            refresh_token: refresh_plaintext,
            user: user.into(),
        },
    }))
}

/// POST /api/v1/auth/logout
///
/// Revoke the presented refresh token. The access token expires on its own.
pub async fn logout(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let hash = jwt::hash_refresh_token(&input.refresh_token);
    SessionRepo::revoke(&state.pool, &hash).await?;

    tracing::info!(user_id = auth.user_id, "User logged out");
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(auth.user_id),
            action: dataport_core::audit::ACTION_AUTH_LOGOUT.to_string(),
            entity_type: None,
            entity_id: None,
            details: None,
        },
    )
    .await;

    Ok(Json(DataResponse {
        data: serde_json::json!({ "logged_out": true }),
    }))
}

/// GET /api/v1/auth/me
///
/// The authenticated caller's profile with permission flags.
pub async fn me(current: CurrentUser) -> Json<DataResponse<UserResponse>> {
    Json(DataResponse {
        data: current.user.into(),
    })
}
