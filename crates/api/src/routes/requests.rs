//! Route definitions for the access-request lifecycle.
//!
//! ```text
//! GET    /                       list_requests
//! POST   /                       create_request
//! GET    /{request_id}           get_request
//! PATCH  /{request_id}           update_request
//! DELETE /{request_id}           delete_request
//! POST   /{request_id}/submit    submit_request
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::requests;
use crate::state::AppState;

/// Request routes, merged into `/requests`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(requests::list_requests).post(requests::create_request))
        .route(
            "/{request_id}",
            get(requests::get_request)
                .patch(requests::update_request)
                .delete(requests::delete_request),
        )
        .route("/{request_id}/submit", post(requests::submit_request))
}
