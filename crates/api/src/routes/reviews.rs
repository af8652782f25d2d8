//! Route definitions for the reviewer inbox and decisions.
//!
//! ```text
//! GET    /mine                      my_reviews
//! POST   /{review_id}/decision      decide
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::reviews;
use crate::state::AppState;

/// Review routes, merged into `/reviews`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(reviews::my_reviews))
        .route("/{review_id}/decision", post(reviews::decide))
}
