//! Route definitions for user administration.
//!
//! ```text
//! GET    /users              list_users
//! POST   /users              create_user
//! GET    /users/{user_id}    get_user
//! PATCH  /users/{user_id}    update_user
//! DELETE /users/{user_id}    deactivate_user
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Admin routes, merged into `/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{user_id}",
            get(admin::get_user)
                .patch(admin::update_user)
                .delete(admin::deactivate_user),
        )
}
