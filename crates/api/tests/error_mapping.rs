//! Tests for the error taxonomy's HTTP mapping.
//!
//! Validation and permission failures must keep their specific message;
//! backend and internal failures must be sanitized to a generic one.

use assert_matches::assert_matches;
use axum::http::StatusCode;

use dataport_api::error::{classify, AppError};
use dataport_core::error::CoreError;
use dataport_query::QueryError;

#[test]
fn validation_maps_to_400_with_message() {
    let err = AppError::Core(CoreError::Validation(
        "Criteria incomplete: missing required criteria: period".to_string(),
    ));
    let (status, code, message) = classify(&err);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code, "VALIDATION_ERROR");
    assert!(message.contains("period"));
}

#[test]
fn forbidden_maps_to_403() {
    let err = AppError::Core(CoreError::Forbidden(
        "Permission 'manage_users' required".to_string(),
    ));
    let (status, code, _) = classify(&err);
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(code, "FORBIDDEN");
}

#[test]
fn not_found_maps_to_404_naming_the_entity() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Dataset",
        id: 7,
    });
    let (status, _, message) = classify(&err);
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(message.contains("Dataset"));
    assert!(message.contains('7'));
}

#[test]
fn conflict_maps_to_409() {
    let err = AppError::Core(CoreError::Conflict(
        "Request has already been submitted".to_string(),
    ));
    let (status, code, _) = classify(&err);
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code, "CONFLICT");
}

#[test]
fn backend_outage_maps_to_502_without_leaking_detail() {
    let err = AppError::Query(QueryError::Unavailable(
        "request to http://10.0.0.3:9200/v1/preview failed: connection refused".to_string(),
    ));
    let (status, code, message) = classify(&err);
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(code, "QUERY_BACKEND_UNAVAILABLE");
    // The internal address must not reach the caller.
    assert!(!message.contains("10.0.0.3"));
    assert!(message.contains("try again") || message.contains("Try again"));
}

#[test]
fn incomplete_criteria_from_backend_maps_to_400() {
    let err = AppError::Query(QueryError::IncompleteCriteria(
        "period is required".to_string(),
    ));
    let (status, code, _) = classify(&err);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code, "INCOMPLETE_CRITERIA");
}

#[test]
fn internal_errors_are_sanitized() {
    let err = AppError::InternalError("secret connection string leaked".to_string());
    let (status, _, message) = classify(&err);
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message, "An internal error occurred");
}

#[test]
fn sqlx_row_not_found_maps_to_404() {
    let err = AppError::Database(sqlx::Error::RowNotFound);
    let (status, code, _) = classify(&err);
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(code, "NOT_FOUND");
}

#[test]
fn core_errors_convert_via_from() {
    let err: AppError = CoreError::Forbidden("nope".to_string()).into();
    assert_matches!(err, AppError::Core(CoreError::Forbidden(_)));

    let err: AppError = QueryError::Unavailable("down".to_string()).into();
    assert_matches!(err, AppError::Query(QueryError::Unavailable(_)));
}
