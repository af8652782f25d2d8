//! Route definitions for authentication.
//!
//! ```text
//! POST   /login      login (public)
//! POST   /refresh    refresh (public)
//! POST   /logout     logout (requires auth)
//! GET    /me         current user profile
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Auth routes, merged into `/auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}
