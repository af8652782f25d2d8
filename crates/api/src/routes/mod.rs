pub mod admin;
pub mod auth;
pub mod categories;
pub mod datasets;
pub mod health;
pub mod requests;
pub mod reviews;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                              login (public)
/// /auth/refresh                            refresh (public)
/// /auth/logout                             logout
/// /auth/me                                 current user profile
///
/// /datasets                                list, create
/// /datasets/{id}                           get, update, deactivate
/// /datasets/{id}/criteria-schema           derived criteria schema
/// /datasets/{id}/preview                   bounded sample query
/// /datasets/{id}/export                    full extract
/// /datasets/{id}/reviewers                 reviewer configuration
///
/// /categories                              list, create
/// /categories/{id}                         update, delete
///
/// /requests                                list, create
/// /requests/{id}                           get, update, delete
/// /requests/{id}/submit                    submit for review
///
/// /reviews/mine                            reviewer inbox
/// /reviews/{id}/decision                   record decision
///
/// /admin/users                             list, create
/// /admin/users/{id}                        get, update, deactivate
///
/// /audit                                   audit trail query
/// /analytics/summary                       analytics summary
/// ```
pub fn api_v1_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/datasets", datasets::router())
        .nest("/categories", categories::router())
        .nest("/requests", requests::router())
        .nest("/reviews", reviews::router())
        .nest("/admin", admin::router())
        .route("/audit", get(handlers::audit::query_audit_trail))
        .route("/analytics/summary", get(handlers::analytics::summary))
}
