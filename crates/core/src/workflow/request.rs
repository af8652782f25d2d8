//! Access-request state machine.
//!
//! Statuses move along `draft -> pending -> in_review -> {approved,
//! rejected, changes_requested}`. Negative outcomes are not dead ends:
//! editing a `rejected` or `changes_requested` request returns it to
//! `draft`, and resubmission takes the normal `draft -> pending` path. A
//! request is only ever `approved` from `pending` (auto-approval bypass) or
//! `in_review` (unanimous reviewer approval), never directly from a
//! negative status.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Request status
// ---------------------------------------------------------------------------

/// Status values for an access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Draft,
    Pending,
    InReview,
    Approved,
    Rejected,
    ChangesRequested,
}

impl RequestStatus {
    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "in_review" => Ok(Self::InReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "changes_requested" => Ok(Self::ChangesRequested),
            _ => Err(CoreError::Validation(format!(
                "Invalid request status '{s}'. Must be one of: draft, pending, in_review, \
                 approved, rejected, changes_requested"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::ChangesRequested => "changes_requested",
        }
    }

    /// Whether the owner may still edit request content in this status.
    ///
    /// Content is frozen during review and permanently frozen once approved.
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            Self::Draft | Self::Pending | Self::Rejected | Self::ChangesRequested
        )
    }

    /// Whether this status ends a review cycle.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::ChangesRequested)
    }

    /// Whether the state machine permits a transition to `next`.
    ///
    /// Editing a rejected or changes-requested request moves it back to
    /// `draft`; there is no edge from a negative status straight to
    /// `pending` or `approved`.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Pending)
                | (Self::Pending, Self::InReview)
                | (Self::Pending, Self::Approved)
                | (Self::InReview, Self::Approved)
                | (Self::InReview, Self::Rejected)
                | (Self::InReview, Self::ChangesRequested)
                | (Self::Rejected, Self::Draft)
                | (Self::ChangesRequested, Self::Draft)
        )
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Priority values for an access request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Parse a priority string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(CoreError::Validation(format!(
                "Invalid priority '{s}'. Must be one of: low, normal, high, urgent"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

/// Maximum length for a request title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length for a request description.
pub const MAX_DESCRIPTION_LENGTH: usize = 5_000;

/// Validate the free-text fields of a request.
pub fn validate_request_fields(title: &str, description: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".to_string()));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    if description.trim().is_empty() {
        return Err(CoreError::Validation(
            "Description must not be empty".to_string(),
        ));
    }
    if description.len() > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Approval bypass
// ---------------------------------------------------------------------------

/// The approval policy of one selected dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPolicy {
    /// Whether this dataset's requests need reviewer sign-off at all.
    pub requires_approval: bool,
    /// Role names whose requests bypass review for this dataset.
    pub auto_approve_roles: Vec<String>,
}

impl ApprovalPolicy {
    /// Whether a requester with `role` bypasses review for this dataset.
    pub fn bypasses_review(&self, role: &str) -> bool {
        !self.requires_approval || self.auto_approve_roles.iter().any(|r| r == role)
    }
}

/// Whether a submission bypasses review entirely.
///
/// The bypass must hold for every selected dataset: a request mixing an
/// auto-approvable dataset with one that requires review goes to review as a
/// whole.
pub fn auto_approved(owner_role: &str, policies: &[ApprovalPolicy]) -> bool {
    policies.iter().all(|p| p.bypasses_review(owner_role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in [
            "draft",
            "pending",
            "in_review",
            "approved",
            "rejected",
            "changes_requested",
        ] {
            assert_eq!(RequestStatus::from_str_db(s).unwrap().as_str(), s);
        }
        assert!(RequestStatus::from_str_db("archived").is_err());
    }

    #[test]
    fn test_pending_reaches_only_review_or_approved() {
        let from = RequestStatus::Pending;
        assert!(from.can_transition_to(RequestStatus::InReview));
        assert!(from.can_transition_to(RequestStatus::Approved));
        assert!(!from.can_transition_to(RequestStatus::Rejected));
        assert!(!from.can_transition_to(RequestStatus::ChangesRequested));
        assert!(!from.can_transition_to(RequestStatus::Draft));
    }

    #[test]
    fn test_changes_requested_never_lands_directly_in_approved() {
        let from = RequestStatus::ChangesRequested;
        assert!(!from.can_transition_to(RequestStatus::Approved));
        assert!(!from.can_transition_to(RequestStatus::Pending));
        // Resubmission goes through draft.
        assert!(from.can_transition_to(RequestStatus::Draft));
        assert!(RequestStatus::Draft.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn test_rejected_reopens_through_draft() {
        assert!(RequestStatus::Rejected.can_transition_to(RequestStatus::Draft));
        assert!(!RequestStatus::Rejected.can_transition_to(RequestStatus::Approved));
    }

    #[test]
    fn test_approved_is_terminal() {
        let from = RequestStatus::Approved;
        for next in [
            RequestStatus::Draft,
            RequestStatus::Pending,
            RequestStatus::InReview,
            RequestStatus::Rejected,
            RequestStatus::ChangesRequested,
        ] {
            assert!(!from.can_transition_to(next));
        }
        assert!(!from.is_editable());
    }

    #[test]
    fn test_empty_title_rejected() {
        assert!(validate_request_fields("  ", "a description").is_err());
        assert!(validate_request_fields("a title", "").is_err());
        assert!(validate_request_fields("a title", "a description").is_ok());
    }

    #[test]
    fn test_bypass_when_no_approval_required() {
        let policies = [ApprovalPolicy {
            requires_approval: false,
            auto_approve_roles: vec![],
        }];
        assert!(auto_approved("external", &policies));
    }

    #[test]
    fn test_bypass_for_pre_authorized_role() {
        let policies = [ApprovalPolicy {
            requires_approval: true,
            auto_approve_roles: vec!["internal".to_string()],
        }];
        assert!(auto_approved("internal", &policies));
        assert!(!auto_approved("external", &policies));
    }

    #[test]
    fn test_bypass_must_hold_for_every_dataset() {
        let policies = [
            ApprovalPolicy {
                requires_approval: false,
                auto_approve_roles: vec![],
            },
            ApprovalPolicy {
                requires_approval: true,
                auto_approve_roles: vec![],
            },
        ];
        assert!(!auto_approved("external", &policies));
    }
}
