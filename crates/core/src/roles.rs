//! Well-known role name constants.
//!
//! These must match the seed data in the `create_users` migration. Roles
//! identify the kind of account; access decisions are made from the per-user
//! permission flags in [`crate::permissions`], never from the role alone.

use crate::error::CoreError;

/// External requester (citizen, researcher, partner organization).
pub const ROLE_EXTERNAL: &str = "external";

/// Internal government staff member.
pub const ROLE_INTERNAL: &str = "internal";

/// Portal administrator.
pub const ROLE_ADMIN: &str = "admin";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_EXTERNAL, ROLE_INTERNAL, ROLE_ADMIN];

/// Validate that a role string is one of the accepted values.
pub fn validate_role(role: &str) -> Result<(), CoreError> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_roles_accepted() {
        for role in VALID_ROLES {
            assert!(validate_role(role).is_ok());
        }
    }

    #[test]
    fn test_invalid_role_rejected() {
        assert!(validate_role("superuser").is_err());
        assert!(validate_role("").is_err());
    }
}
