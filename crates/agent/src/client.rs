//! HTTP client for the orchestrator API.

use std::time::Duration;

use async_trait::async_trait;
use paral_core::wire::{
    CalculateRequest, CalculateResponse, ErrorResponse, ExpressionResponse, ExpressionsResponse,
    ResultResponse, TaskResponse,
};
use paral_core::{Expression, ExpressionId, ExpressionStatus, ExpressionView, TaskAssignment, TaskReport};
use paral_execution::TaskSource;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Result alias for client calls.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors returned by [`OrchestratorClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport or decoding failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The orchestrator answered with an error status
    #[error("orchestrator returned {status}: {message}")]
    Api {
        /// HTTP status code
        status: StatusCode,
        /// Message from the error body
        message: String,
    },
}

impl ClientError {
    /// HTTP status of an API error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
        }
    }
}

/// Talks to one orchestrator over HTTP.
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    http: reqwest::Client,
    base_url: String,
}

impl OrchestratorClient {
    /// Create a client for the orchestrator at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Orchestrator base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit an expression.
    pub async fn calculate(&self, expression: &str) -> Result<ExpressionId> {
        let request = CalculateRequest { expression: expression.to_string() };
        let response = self.http.post(self.url("/api/v1/calculate")).json(&request).send().await?;
        let created: CalculateResponse = decode(response).await?;
        Ok(created.id)
    }

    /// Fetch one expression with its tasks.
    pub async fn get_expression(&self, id: ExpressionId) -> Result<ExpressionView> {
        let response = self
            .http
            .get(self.url(&format!("/api/v1/expressions/{}", id)))
            .send()
            .await?;
        let body: ExpressionResponse = decode(response).await?;
        Ok(body.expression)
    }

    /// List all expressions.
    pub async fn list_expressions(&self) -> Result<Vec<Expression>> {
        let response = self.http.get(self.url("/api/v1/expressions")).send().await?;
        let body: ExpressionsResponse = decode(response).await?;
        Ok(body.expressions)
    }

    /// Lease a task. `None` when nothing is runnable.
    pub async fn next_task(&self) -> Result<Option<TaskAssignment>> {
        let response = self.http.get(self.url("/internal/task")).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: TaskResponse = decode(response).await?;
        Ok(Some(body.task))
    }

    /// Report a task outcome.
    pub async fn submit_result(&self, report: &TaskReport) -> Result<ExpressionStatus> {
        let response = self
            .http
            .post(self.url("/internal/task/result"))
            .json(report)
            .send()
            .await?;
        let body: ResultResponse = decode(response).await?;
        Ok(body.expression_status)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ClientError::Api { status, message })
}

#[async_trait]
impl TaskSource for OrchestratorClient {
    async fn fetch_task(&self) -> anyhow::Result<Option<TaskAssignment>> {
        Ok(self.next_task().await?)
    }

    async fn report(&self, report: TaskReport) -> anyhow::Result<()> {
        let status = self.submit_result(&report).await?;
        debug!(task_id = %report.id, expression_status = %status, "reported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OrchestratorClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url("/health"), "http://localhost:8080/health");
    }

    #[test]
    fn test_api_error_status() {
        let err = ClientError::Api { status: StatusCode::CONFLICT, message: "done".into() };
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(err.to_string(), "orchestrator returned 409 Conflict: done");
    }
}
