//! Audit action and entity-type name constants.
//!
//! Used by the API layer when writing audit trail entries so action names
//! stay consistent across handlers and queries.

pub const ACTION_AUTH_LOGIN: &str = "auth.login";
pub const ACTION_AUTH_LOGOUT: &str = "auth.logout";

pub const ACTION_DATASET_CREATE: &str = "dataset.create";
pub const ACTION_DATASET_UPDATE: &str = "dataset.update";
pub const ACTION_DATASET_DEACTIVATE: &str = "dataset.deactivate";
pub const ACTION_DATASET_REVIEWERS_SET: &str = "dataset.reviewers_set";
pub const ACTION_DATASET_EXPORT: &str = "dataset.export";

pub const ACTION_CATEGORY_CREATE: &str = "category.create";
pub const ACTION_CATEGORY_UPDATE: &str = "category.update";
pub const ACTION_CATEGORY_DELETE: &str = "category.delete";

pub const ACTION_REQUEST_CREATE: &str = "request.create";
pub const ACTION_REQUEST_UPDATE: &str = "request.update";
pub const ACTION_REQUEST_SUBMIT: &str = "request.submit";
pub const ACTION_REQUEST_DELETE: &str = "request.delete";

pub const ACTION_REVIEW_DECIDE: &str = "review.decide";

pub const ACTION_USER_CREATE: &str = "user.create";
pub const ACTION_USER_UPDATE: &str = "user.update";
pub const ACTION_USER_DEACTIVATE: &str = "user.deactivate";

pub const ENTITY_DATASET: &str = "dataset";
pub const ENTITY_CATEGORY: &str = "category";
pub const ENTITY_REQUEST: &str = "request";
pub const ENTITY_REVIEW: &str = "review";
pub const ENTITY_USER: &str = "user";
