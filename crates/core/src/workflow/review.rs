//! Reviewer assignment levels and decision aggregation.
//!
//! A submitted request carries one review row per assigned reviewer, each
//! with a level (lower levels act first) and an order (display tie-break
//! within a level). Reviewers at level N become actionable only once every
//! review at levels below N is terminal.
//!
//! The parent request's status is always recomputed as a pure fold over the
//! full review set ([`aggregate_request_status`]); it is idempotent and safe
//! to recompute at any time, so near-simultaneous sibling decisions converge
//! regardless of arrival order.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;
use crate::workflow::request::RequestStatus;

// ---------------------------------------------------------------------------
// Review status
// ---------------------------------------------------------------------------

/// Status values for a single reviewer's assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    InProgress,
    Approved,
    Rejected,
    ChangesRequested,
}

impl ReviewStatus {
    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "changes_requested" => Ok(Self::ChangesRequested),
            _ => Err(CoreError::Validation(format!(
                "Invalid review status '{s}'. Must be one of: pending, in_progress, approved, \
                 rejected, changes_requested"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::ChangesRequested => "changes_requested",
        }
    }

    /// Whether this review has reached a final decision.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::ChangesRequested)
    }
}

// ---------------------------------------------------------------------------
// Reviewer decisions
// ---------------------------------------------------------------------------

/// A decision a reviewer may post against their own review row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Claim the review without deciding yet.
    InProgress,
    Approved,
    Rejected,
    ChangesRequested,
}

impl ReviewDecision {
    /// Parse a decision string from a request body.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "changes_requested" => Ok(Self::ChangesRequested),
            _ => Err(CoreError::Validation(format!(
                "Invalid decision '{s}'. Must be one of: in_progress, approved, rejected, \
                 changes_requested"
            ))),
        }
    }

    /// The review status this decision puts the row into.
    pub fn to_status(self) -> ReviewStatus {
        match self {
            Self::InProgress => ReviewStatus::InProgress,
            Self::Approved => ReviewStatus::Approved,
            Self::Rejected => ReviewStatus::Rejected,
            Self::ChangesRequested => ReviewStatus::ChangesRequested,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// The minimal projection of a review row needed for gating and aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewState {
    pub id: DbId,
    pub reviewer_user_id: DbId,
    pub review_level: i32,
    pub status: ReviewStatus,
}

/// How negative decisions interact with sibling reviewers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregationPolicy {
    /// A single `rejected` or `changes_requested` decision resolves the
    /// request immediately, without waiting for sibling reviewers.
    #[default]
    ShortCircuit,
    /// Negative decisions take effect only once every review at the
    /// deciding level is terminal.
    WaitForLevel,
}

/// The lowest review level that still has unresolved reviews, if any.
///
/// Reviews at this level are the only actionable ones; higher levels wait.
pub fn active_level(reviews: &[ReviewState]) -> Option<i32> {
    reviews
        .iter()
        .filter(|r| !r.status.is_terminal())
        .map(|r| r.review_level)
        .min()
}

/// Whether a reviewer may act on the given review row right now.
///
/// The row must belong to the acting user, must not already be decided, and
/// its level must be the active level of the request.
pub fn is_actionable(review: &ReviewState, all: &[ReviewState], acting_user: DbId) -> bool {
    review.reviewer_user_id == acting_user
        && !review.status.is_terminal()
        && active_level(all) == Some(review.review_level)
}

/// Recompute the parent request's status from the full review set.
///
/// Pure fold, idempotent: feeding the same review set twice yields the same
/// result. An empty set aggregates to `Approved` (vacuously unanimous);
/// callers must not enter review with zero assignments.
pub fn aggregate_request_status(
    reviews: &[ReviewState],
    policy: AggregationPolicy,
) -> RequestStatus {
    let effective: Vec<&ReviewState> = match policy {
        AggregationPolicy::ShortCircuit => reviews.iter().collect(),
        AggregationPolicy::WaitForLevel => {
            // Only levels that are fully terminal contribute decisions.
            let open_level = active_level(reviews);
            reviews
                .iter()
                .filter(|r| open_level.is_none_or(|l| r.review_level < l))
                .collect()
        }
    };

    if effective
        .iter()
        .any(|r| r.status == ReviewStatus::Rejected)
    {
        return RequestStatus::Rejected;
    }
    if effective
        .iter()
        .any(|r| r.status == ReviewStatus::ChangesRequested)
    {
        return RequestStatus::ChangesRequested;
    }
    if reviews.iter().all(|r| r.status == ReviewStatus::Approved) {
        return RequestStatus::Approved;
    }
    RequestStatus::InReview
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: DbId, reviewer: DbId, level: i32, status: ReviewStatus) -> ReviewState {
        ReviewState {
            id,
            reviewer_user_id: reviewer,
            review_level: level,
            status,
        }
    }

    #[test]
    fn test_review_status_round_trip() {
        for s in [
            "pending",
            "in_progress",
            "approved",
            "rejected",
            "changes_requested",
        ] {
            assert_eq!(ReviewStatus::from_str_db(s).unwrap().as_str(), s);
        }
        assert!(ReviewStatus::from_str_db("cancelled").is_err());
    }

    #[test]
    fn test_active_level_is_lowest_unresolved() {
        let reviews = [
            review(1, 10, 1, ReviewStatus::Approved),
            review(2, 11, 1, ReviewStatus::Approved),
            review(3, 12, 2, ReviewStatus::Pending),
            review(4, 13, 3, ReviewStatus::Pending),
        ];
        assert_eq!(active_level(&reviews), Some(2));
    }

    #[test]
    fn test_higher_level_not_actionable_until_lower_resolves() {
        let reviews = [
            review(1, 10, 1, ReviewStatus::Pending),
            review(2, 11, 2, ReviewStatus::Pending),
        ];
        assert!(is_actionable(&reviews[0], &reviews, 10));
        assert!(!is_actionable(&reviews[1], &reviews, 11));

        let resolved = [
            review(1, 10, 1, ReviewStatus::Approved),
            review(2, 11, 2, ReviewStatus::Pending),
        ];
        assert!(is_actionable(&resolved[1], &resolved, 11));
    }

    #[test]
    fn test_only_own_undecided_row_is_actionable() {
        let reviews = [review(1, 10, 1, ReviewStatus::InProgress)];
        assert!(is_actionable(&reviews[0], &reviews, 10));
        assert!(!is_actionable(&reviews[0], &reviews, 99));

        let decided = [review(1, 10, 1, ReviewStatus::Approved)];
        assert!(!is_actionable(&decided[0], &decided, 10));
    }

    #[test]
    fn test_single_rejection_fails_request_regardless_of_siblings() {
        for sibling in [
            ReviewStatus::Pending,
            ReviewStatus::InProgress,
            ReviewStatus::Approved,
            ReviewStatus::ChangesRequested,
        ] {
            let reviews = [
                review(1, 10, 1, sibling),
                review(2, 11, 1, ReviewStatus::Rejected),
            ];
            assert_eq!(
                aggregate_request_status(&reviews, AggregationPolicy::ShortCircuit),
                RequestStatus::Rejected,
            );
        }
    }

    #[test]
    fn test_changes_requested_short_circuits() {
        let reviews = [
            review(1, 10, 1, ReviewStatus::Pending),
            review(2, 11, 1, ReviewStatus::ChangesRequested),
        ];
        assert_eq!(
            aggregate_request_status(&reviews, AggregationPolicy::ShortCircuit),
            RequestStatus::ChangesRequested,
        );
    }

    #[test]
    fn test_rejection_outranks_changes_requested() {
        let reviews = [
            review(1, 10, 1, ReviewStatus::ChangesRequested),
            review(2, 11, 1, ReviewStatus::Rejected),
        ];
        assert_eq!(
            aggregate_request_status(&reviews, AggregationPolicy::ShortCircuit),
            RequestStatus::Rejected,
        );
    }

    #[test]
    fn test_unanimous_approval_across_levels() {
        let reviews = [
            review(1, 10, 1, ReviewStatus::Approved),
            review(2, 11, 1, ReviewStatus::Approved),
            review(3, 12, 2, ReviewStatus::Approved),
        ];
        assert_eq!(
            aggregate_request_status(&reviews, AggregationPolicy::ShortCircuit),
            RequestStatus::Approved,
        );
    }

    #[test]
    fn test_open_reviews_keep_request_in_review() {
        let reviews = [
            review(1, 10, 1, ReviewStatus::Approved),
            review(2, 11, 2, ReviewStatus::Pending),
        ];
        assert_eq!(
            aggregate_request_status(&reviews, AggregationPolicy::ShortCircuit),
            RequestStatus::InReview,
        );
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let reviews = [
            review(1, 10, 1, ReviewStatus::Approved),
            review(2, 11, 1, ReviewStatus::Rejected),
            review(3, 12, 2, ReviewStatus::Pending),
        ];
        let first = aggregate_request_status(&reviews, AggregationPolicy::ShortCircuit);
        let second = aggregate_request_status(&reviews, AggregationPolicy::ShortCircuit);
        assert_eq!(first, second);
        assert_eq!(first, RequestStatus::Rejected);
    }

    #[test]
    fn test_wait_for_level_defers_negative_decision() {
        // Level 1 has a rejection but also an open sibling: under
        // WaitForLevel the rejection does not take effect yet.
        let reviews = [
            review(1, 10, 1, ReviewStatus::Rejected),
            review(2, 11, 1, ReviewStatus::Pending),
        ];
        assert_eq!(
            aggregate_request_status(&reviews, AggregationPolicy::WaitForLevel),
            RequestStatus::InReview,
        );

        // Once the level is fully terminal the rejection lands.
        let resolved = [
            review(1, 10, 1, ReviewStatus::Rejected),
            review(2, 11, 1, ReviewStatus::Approved),
        ];
        assert_eq!(
            aggregate_request_status(&resolved, AggregationPolicy::WaitForLevel),
            RequestStatus::Rejected,
        );
    }

    #[test]
    fn test_empty_review_set_is_vacuously_approved() {
        assert_eq!(
            aggregate_request_status(&[], AggregationPolicy::ShortCircuit),
            RequestStatus::Approved,
        );
    }
}
