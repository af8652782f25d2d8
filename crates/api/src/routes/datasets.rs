//! Route definitions for datasets, criteria, preview, export, and
//! reviewer configuration.
//!
//! ```text
//! GET    /                                  list_datasets
//! POST   /                                  create_dataset (configure)
//! GET    /{dataset_id}                      get_dataset
//! PATCH  /{dataset_id}                      update_dataset (configure)
//! DELETE /{dataset_id}                      deactivate_dataset (configure)
//! GET    /{dataset_id}/criteria-schema      get_criteria_schema
//! POST   /{dataset_id}/preview              preview_dataset
//! POST   /{dataset_id}/export               export_dataset (export)
//! GET    /{dataset_id}/reviewers            list_reviewers (configure)
//! PUT    /{dataset_id}/reviewers            set_reviewers (configure)
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::datasets;
use crate::state::AppState;

/// Dataset routes, merged into `/datasets`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(datasets::list_datasets).post(datasets::create_dataset))
        .route(
            "/{dataset_id}",
            get(datasets::get_dataset)
                .patch(datasets::update_dataset)
                .delete(datasets::deactivate_dataset),
        )
        .route(
            "/{dataset_id}/criteria-schema",
            get(datasets::get_criteria_schema),
        )
        .route("/{dataset_id}/preview", post(datasets::preview_dataset))
        .route("/{dataset_id}/export", post(datasets::export_dataset))
        .route(
            "/{dataset_id}/reviewers",
            get(datasets::list_reviewers).put(datasets::set_reviewers),
        )
}
