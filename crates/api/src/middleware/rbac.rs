//! Permission-gating extractor.
//!
//! Unlike role-equality checks, every gate here is an explicit permission
//! flag on the user row: the token's role claim is never enough on its own.
//! [`CurrentUser`] loads the caller's row once per request; handlers then
//! call [`CurrentUser::require`] for each gated action so denials carry the
//! action name.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use dataport_core::error::CoreError;
use dataport_core::permissions::{can, Action, PermissionSet};
use dataport_core::types::DbId;
use dataport_db::models::user::User;
use dataport_db::repositories::UserRepo;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller with their full user row loaded.
///
/// Rejects with 401 if the token is invalid and 403 if the account has been
/// deactivated since the token was issued.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
}

impl CurrentUser {
    /// The caller's database id.
    pub fn id(&self) -> DbId {
        self.user.id
    }

    /// The caller's permission flags.
    pub fn permissions(&self) -> PermissionSet {
        self.user.permission_set()
    }

    /// Whether the caller may perform an action.
    pub fn allows(&self, action: Action) -> bool {
        can(&self.permissions(), action)
    }

    /// Require a permission flag, or fail with 403 naming the action.
    pub fn require(&self, action: Action) -> Result<(), AppError> {
        if self.allows(action) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(format!(
                "Permission '{}' required",
                action.as_str()
            ))))
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;

        let user = UserRepo::find_by_id(&state.pool, auth.user_id)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Unknown user".into()))
            })?;

        if !user.is_active {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is deactivated".into(),
            )));
        }

        Ok(CurrentUser { user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn user_with(permissions: PermissionSet) -> CurrentUser {
        CurrentUser {
            user: User {
                id: 1,
                name: "Test User".to_string(),
                email: "test@example.org".to_string(),
                password_hash: String::new(),
                role: "internal".to_string(),
                organization: None,
                position: None,
                can_view_all_requests: permissions.can_view_all_requests,
                can_approve_requests: permissions.can_approve_requests,
                can_manage_users: permissions.can_manage_users,
                can_view_audit_trail: permissions.can_view_audit_trail,
                can_export_data: permissions.can_export_data,
                can_configure_datasets: permissions.can_configure_datasets,
                can_view_analytics: permissions.can_view_analytics,
                is_reviewer: permissions.is_reviewer,
                is_active: true,
                last_login_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_require_denies_without_flag() {
        let user = user_with(PermissionSet::default());
        let result = user.require(Action::ManageUsers);
        assert_matches!(result, Err(AppError::Core(CoreError::Forbidden(_))));
    }

    #[test]
    fn test_require_allows_with_flag() {
        let user = user_with(PermissionSet {
            can_manage_users: true,
            ..PermissionSet::default()
        });
        assert!(user.require(Action::ManageUsers).is_ok());
        // The flag grants exactly its own action.
        assert!(user.require(Action::ConfigureDatasets).is_err());
    }
}
