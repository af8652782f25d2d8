//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dataport_core::permissions::PermissionSet;
use dataport_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses
/// directly. Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub organization: Option<String>,
    pub position: Option<String>,
    pub can_view_all_requests: bool,
    pub can_approve_requests: bool,
    pub can_manage_users: bool,
    pub can_view_audit_trail: bool,
    pub can_export_data: bool,
    pub can_configure_datasets: bool,
    pub can_view_analytics: bool,
    pub is_reviewer: bool,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// The user's permission flags as a policy input.
    pub fn permission_set(&self) -> PermissionSet {
        PermissionSet {
            can_view_all_requests: self.can_view_all_requests,
            can_approve_requests: self.can_approve_requests,
            can_manage_users: self.can_manage_users,
            can_view_audit_trail: self.can_view_audit_trail,
            can_export_data: self.can_export_data,
            can_configure_datasets: self.can_configure_datasets,
            can_view_analytics: self.can_view_analytics,
            is_reviewer: self.is_reviewer,
        }
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
    pub organization: Option<String>,
    pub position: Option<String>,
    pub permissions: PermissionSet,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let permissions = user.permission_set();
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            organization: user.organization,
            position: user.position,
            permissions,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user. The caller hashes the password; plaintext
/// never reaches this layer.
#[derive(Debug)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub organization: Option<String>,
    pub position: Option<String>,
    pub permissions: PermissionSet,
}

/// DTO for updating an existing user. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub organization: Option<String>,
    pub position: Option<String>,
    pub permissions: Option<PermissionSet>,
    pub is_active: Option<bool>,
}
