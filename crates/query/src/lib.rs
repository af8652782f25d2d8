//! HTTP client for the external data query backend.
//!
//! The query backend executes dataset queries against the underlying
//! records store and returns bounded samples (previews) or full extracts
//! (exports). This crate only speaks the backend's HTTP/JSON contract;
//! criteria validation happens in `dataport-core` before a call is made.

pub mod client;
pub mod types;

pub use client::{QueryClient, QueryError};
pub use types::{ExportResult, PreviewResult, PREVIEW_ROW_LIMIT};
