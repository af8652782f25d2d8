//! Request extractors for authentication and permission gating.

pub mod auth;
pub mod rbac;
