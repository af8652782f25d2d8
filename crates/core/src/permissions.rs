//! Central permission policy.
//!
//! Every gated operation in the portal funnels through [`can`] or one of the
//! request-scoped helpers here. Decisions are pure functions of the acting
//! user's explicit permission flags and, for request operations, ownership
//! and request status. The user's role is never consulted: admin accounts
//! are provisioned with all flags set at the data layer, so a missing flag
//! always means "denied" regardless of role.
//!
//! Callers pass the acting user explicitly; there is no ambient session
//! state anywhere in this crate.

use serde::{Deserialize, Serialize};

use crate::types::DbId;
use crate::workflow::request::RequestStatus;

/// Per-user permission flags, loaded from the `users` row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub can_view_all_requests: bool,
    pub can_approve_requests: bool,
    pub can_manage_users: bool,
    pub can_view_audit_trail: bool,
    pub can_export_data: bool,
    pub can_configure_datasets: bool,
    pub can_view_analytics: bool,
    pub is_reviewer: bool,
}

impl PermissionSet {
    /// A set with every flag enabled, as provisioned for admin accounts.
    pub fn all() -> Self {
        Self {
            can_view_all_requests: true,
            can_approve_requests: true,
            can_manage_users: true,
            can_view_audit_trail: true,
            can_export_data: true,
            can_configure_datasets: true,
            can_view_analytics: true,
            is_reviewer: true,
        }
    }
}

/// Gated actions a user may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewAllRequests,
    ApproveRequests,
    ManageUsers,
    ConfigureDatasets,
    ViewAnalytics,
    ViewAuditTrail,
    ExportData,
    Review,
}

impl Action {
    /// Human-readable name used in denial messages and audit entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewAllRequests => "view_all_requests",
            Self::ApproveRequests => "approve_requests",
            Self::ManageUsers => "manage_users",
            Self::ConfigureDatasets => "configure_datasets",
            Self::ViewAnalytics => "view_analytics",
            Self::ViewAuditTrail => "view_audit_trail",
            Self::ExportData => "export_data",
            Self::Review => "review",
        }
    }
}

/// Whether the given permission set allows an action.
pub fn can(perms: &PermissionSet, action: Action) -> bool {
    match action {
        Action::ViewAllRequests => perms.can_view_all_requests,
        Action::ApproveRequests => perms.can_approve_requests,
        Action::ManageUsers => perms.can_manage_users,
        Action::ConfigureDatasets => perms.can_configure_datasets,
        Action::ViewAnalytics => perms.can_view_analytics,
        Action::ViewAuditTrail => perms.can_view_audit_trail,
        Action::ExportData => perms.can_export_data,
        Action::Review => perms.is_reviewer,
    }
}

/// Whether a user may view a request: elevated view permission or ownership.
pub fn can_view_request(viewer_id: DbId, perms: &PermissionSet, owner_id: DbId) -> bool {
    can(perms, Action::ViewAllRequests) || viewer_id == owner_id
}

/// Whether a user may edit a request's content.
///
/// Ownership is mandatory; elevated view permission never grants edit rights
/// over someone else's request. Content is frozen once a request reaches
/// `in_review` or `approved`.
pub fn can_edit_request(actor_id: DbId, owner_id: DbId, status: RequestStatus) -> bool {
    actor_id == owner_id && status.is_editable()
}

/// Whether a user may delete a request.
///
/// Only the owner, and only while nothing has been reviewed: a `draft`, or a
/// `pending` request with zero resolved reviews. Used to reap requests
/// abandoned mid-creation.
pub fn can_delete_request(
    actor_id: DbId,
    owner_id: DbId,
    status: RequestStatus,
    resolved_reviews: usize,
) -> bool {
    if actor_id != owner_id {
        return false;
    }
    match status {
        RequestStatus::Draft => true,
        RequestStatus::Pending => resolved_reviews == 0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_action_maps_to_exactly_one_flag() {
        let actions = [
            Action::ViewAllRequests,
            Action::ApproveRequests,
            Action::ManageUsers,
            Action::ConfigureDatasets,
            Action::ViewAnalytics,
            Action::ViewAuditTrail,
            Action::ExportData,
            Action::Review,
        ];

        // With no flags set, everything is denied.
        let none = PermissionSet::default();
        for action in actions {
            assert!(!can(&none, action), "{} allowed with no flags", action.as_str());
        }

        // With all flags set, everything is allowed.
        let all = PermissionSet::all();
        for action in actions {
            assert!(can(&all, action), "{} denied with all flags", action.as_str());
        }
    }

    #[test]
    fn test_single_flag_grants_single_action() {
        let perms = PermissionSet {
            can_export_data: true,
            ..PermissionSet::default()
        };
        assert!(can(&perms, Action::ExportData));
        assert!(!can(&perms, Action::ViewAllRequests));
        assert!(!can(&perms, Action::ManageUsers));
    }

    #[test]
    fn test_owner_can_view_own_request_without_flag() {
        let perms = PermissionSet::default();
        assert!(can_view_request(7, &perms, 7));
        assert!(!can_view_request(7, &perms, 8));
    }

    #[test]
    fn test_elevated_viewer_can_view_any_request() {
        let perms = PermissionSet {
            can_view_all_requests: true,
            ..PermissionSet::default()
        };
        assert!(can_view_request(7, &perms, 8));
    }

    #[test]
    fn test_non_owner_cannot_edit_regardless_of_status() {
        for status in [
            RequestStatus::Draft,
            RequestStatus::Pending,
            RequestStatus::InReview,
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::ChangesRequested,
        ] {
            assert!(!can_edit_request(7, 8, status));
        }
    }

    #[test]
    fn test_owner_edit_rights_follow_status() {
        assert!(can_edit_request(7, 7, RequestStatus::Draft));
        assert!(can_edit_request(7, 7, RequestStatus::Pending));
        assert!(can_edit_request(7, 7, RequestStatus::Rejected));
        assert!(can_edit_request(7, 7, RequestStatus::ChangesRequested));
        assert!(!can_edit_request(7, 7, RequestStatus::InReview));
        assert!(!can_edit_request(7, 7, RequestStatus::Approved));
    }

    #[test]
    fn test_delete_only_before_review_activity() {
        assert!(can_delete_request(7, 7, RequestStatus::Draft, 0));
        assert!(can_delete_request(7, 7, RequestStatus::Pending, 0));
        assert!(!can_delete_request(7, 7, RequestStatus::Pending, 1));
        assert!(!can_delete_request(7, 7, RequestStatus::InReview, 0));
        assert!(!can_delete_request(8, 7, RequestStatus::Draft, 0));
    }
}
