//! Handlers for the reviewer inbox and review decisions.
//!
//! A decision mutates only the acting reviewer's own row; the parent
//! request's status is then recomputed as a pure fold over the full review
//! set inside the same transaction. Recomputing is idempotent, so two
//! reviewers deciding near-simultaneously converge to the same request
//! status regardless of commit order.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use dataport_core::audit::{ACTION_REVIEW_DECIDE, ENTITY_REVIEW};
use dataport_core::error::CoreError;
use dataport_core::permissions::Action;
use dataport_core::types::DbId;
use dataport_core::workflow::request::RequestStatus;
use dataport_core::workflow::review::{
    aggregate_request_status, is_actionable, AggregationPolicy, ReviewDecision, ReviewStatus,
};
use dataport_db::models::audit::CreateAuditLog;
use dataport_db::models::review::DecisionRequest;
use dataport_db::repositories::{RequestRepo, ReviewRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::rbac::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the reviewer inbox.
#[derive(Debug, Deserialize)]
pub struct InboxParams {
    pub status: Option<String>,
}

/// GET /api/v1/reviews/mine
///
/// The caller's review assignments, optionally filtered by review status.
pub async fn my_reviews(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<InboxParams>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::Review)?;

    if let Some(status) = &params.status {
        ReviewStatus::from_str_db(status).map_err(AppError::Core)?;
    }

    let reviews =
        ReviewRepo::list_for_reviewer(&state.pool, current.id(), params.status.as_deref())
            .await?;
    Ok(Json(DataResponse { data: reviews }))
}

/// POST /api/v1/reviews/{review_id}/decision
///
/// Record a decision on the caller's own review row and recompute the
/// parent request's status. A terminal negative decision short-circuits the
/// request and cancels the remaining open reviews.
pub async fn decide(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(review_id): Path<DbId>,
    Json(input): Json<DecisionRequest>,
) -> AppResult<impl IntoResponse> {
    current.require(Action::Review)?;

    let decision = ReviewDecision::from_str_value(&input.decision).map_err(AppError::Core)?;
    // Claiming a review only needs the reviewer flag; issuing a verdict
    // additionally needs the approve-requests permission.
    if decision != ReviewDecision::InProgress {
        current.require(Action::ApproveRequests)?;
    }

    let review = ReviewRepo::find_by_id(&state.pool, review_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Review",
                id: review_id,
            })
        })?;

    if review.reviewer_user_id != current.id() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You may only act on your own review assignments".into(),
        )));
    }

    let mut tx = state.pool.begin().await?;

    // Lock the parent request: concurrent sibling decisions serialize on
    // this row, and each recomputes from the full review set it observes.
    let request = RequestRepo::find_by_id_for_update(&mut *tx, review.request_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Request",
                id: review.request_id,
            })
        })?;

    let all_reviews = ReviewRepo::list_for_request(&mut *tx, request.id).await?;
    let states = all_reviews
        .iter()
        .map(|r| r.to_state())
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::Core)?;
    let own_state = states
        .iter()
        .find(|s| s.id == review_id)
        .copied()
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Review",
                id: review_id,
            })
        })?;

    if !is_actionable(&own_state, &states, current.id()) {
        return Err(AppError::Core(CoreError::Validation(
            "Review is not actionable: it is already decided or an earlier \
             review level is still open"
                .into(),
        )));
    }

    let updated = ReviewRepo::record_decision(
        &mut *tx,
        review_id,
        decision.to_status().as_str(),
        input.notes.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "Review was decided concurrently".into(),
        ))
    })?;

    // Recompute the parent status from the post-decision review set.
    let all_reviews = ReviewRepo::list_for_request(&mut *tx, request.id).await?;
    let states = all_reviews
        .iter()
        .map(|r| r.to_state())
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::Core)?;
    let aggregate = aggregate_request_status(&states, AggregationPolicy::default());

    let request_status = request.status().map_err(AppError::Core)?;
    if aggregate != request_status && request_status == RequestStatus::InReview {
        RequestRepo::transition(
            &mut *tx,
            request.id,
            RequestStatus::InReview.as_str(),
            aggregate.as_str(),
        )
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Request changed state while the decision was recorded".into(),
            ))
        })?;

        // A resolved request has no use for its still-open reviews.
        if aggregate.is_resolved() {
            let cancelled =
                ReviewRepo::delete_unresolved_for_request(&mut *tx, request.id).await?;
            if cancelled > 0 {
                tracing::info!(
                    request_id = request.id,
                    cancelled,
                    "Cancelled open reviews after short-circuit resolution"
                );
            }
        }
    }

    tx.commit().await?;

    tracing::info!(
        user_id = current.id(),
        review_id,
        request_id = request.id,
        decision = %input.decision,
        request_status = %aggregate.as_str(),
        "Review decision recorded"
    );
    record_audit(
        &state.pool,
        CreateAuditLog {
            user_id: Some(current.id()),
            action: ACTION_REVIEW_DECIDE.to_string(),
            entity_type: Some(ENTITY_REVIEW),
            entity_id: Some(review_id),
            details: Some(serde_json::json!({
                "decision": input.decision,
                "request_id": request.id,
                "request_status": aggregate.as_str(),
            })),
        },
    )
    .await;

    Ok(Json(DataResponse { data: updated }))
}
