//! HTTP client for a single query backend instance.
//!
//! [`QueryClient`] holds the connection configuration for the backend.
//! Every call is a single request/response round trip: failures surface to
//! the caller as-is and are never retried here, so a failed preview or
//! export can simply be re-triggered.

use serde::Serialize;

use dataport_core::criteria::values::CriteriaValues;

use crate::types::{ExportResult, PreviewResult, PREVIEW_ROW_LIMIT};

/// Configuration handle for the query backend.
pub struct QueryClient {
    base_url: String,
    http: reqwest::Client,
}

/// Errors that can occur when calling the query backend.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The backend rejected the criteria as incomplete (HTTP 400 with an
    /// `incomplete_criteria` code). Callers validate before calling, so
    /// seeing this means client and backend disagree on the schema.
    #[error("Query backend rejected criteria as incomplete: {0}")]
    IncompleteCriteria(String),

    /// The backend rejected the request for another reason (other 4xx).
    #[error("Query backend rejected the request: {0}")]
    Backend(String),

    /// Transport failure or backend 5xx. Surfaced verbatim, not retried.
    #[error("Query backend unavailable: {0}")]
    Unavailable(String),
}

/// Request payload for preview and export calls.
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    dataset: &'a str,
    criteria: &'a CriteriaValues,
    limit: Option<usize>,
}

/// Error payload the backend returns on 4xx.
#[derive(Debug, serde::Deserialize)]
struct BackendError {
    code: Option<String>,
    message: Option<String>,
}

impl QueryClient {
    /// Create a new client targeting the backend at `base_url`
    /// (e.g. `http://query-backend:9200`).
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Base HTTP URL of the backend.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a preview query: a bounded sample plus the total match count.
    pub async fn preview(
        &self,
        dataset_name: &str,
        criteria: &CriteriaValues,
    ) -> Result<PreviewResult, QueryError> {
        let payload = QueryRequest {
            dataset: dataset_name,
            criteria,
            limit: Some(PREVIEW_ROW_LIMIT),
        };
        let mut result: PreviewResult = self.post("/v1/preview", &payload).await?;

        // The backend honors the limit, but the cap is part of this
        // client's contract, so enforce it here as well.
        result.preview_rows.truncate(PREVIEW_ROW_LIMIT);

        tracing::debug!(
            dataset = dataset_name,
            total_rows = result.total_rows,
            execution_time = %result.execution_time,
            "Preview query completed"
        );
        Ok(result)
    }

    /// Run a full export query.
    pub async fn export(
        &self,
        dataset_name: &str,
        criteria: &CriteriaValues,
    ) -> Result<ExportResult, QueryError> {
        let payload = QueryRequest {
            dataset: dataset_name,
            criteria,
            limit: None,
        };
        let result: ExportResult = self.post("/v1/export", &payload).await?;

        tracing::info!(
            dataset = dataset_name,
            total_rows = result.total_rows,
            "Export query completed"
        );
        Ok(result)
    }

    /// POST a JSON payload and decode a JSON response, mapping HTTP
    /// failure classes onto [`QueryError`].
    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        payload: &QueryRequest<'_>,
    ) -> Result<T, QueryError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| QueryError::Unavailable(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(QueryError::Unavailable(format!(
                "backend returned {status} for {url}"
            )));
        }
        if status.is_client_error() {
            let error: BackendError = response.json().await.unwrap_or(BackendError {
                code: None,
                message: None,
            });
            let message = error
                .message
                .unwrap_or_else(|| format!("backend returned {status}"));
            return match error.code.as_deref() {
                Some("incomplete_criteria") => Err(QueryError::IncompleteCriteria(message)),
                _ => Err(QueryError::Backend(message)),
            };
        }

        response
            .json()
            .await
            .map_err(|e| QueryError::Unavailable(format!("invalid response from {url}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = QueryClient::new("http://localhost:9200/".to_string());
        assert_eq!(client.base_url(), "http://localhost:9200");
    }
}
