//! Route definitions for dataset categories.
//!
//! ```text
//! GET    /                  list_categories
//! POST   /                  create_category (configure)
//! PATCH  /{category_id}     update_category (configure)
//! DELETE /{category_id}     delete_category (configure)
//! ```

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::categories;
use crate::state::AppState;

/// Category routes, merged into `/categories`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/{category_id}",
            patch(categories::update_category).delete(categories::delete_category),
        )
}
