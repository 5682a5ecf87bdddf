use anyhow::{Context, Result};
use std::env;

use crate::api::{CreateHighlights, IngestSummary};
use crate::model::Highlight;

/// Environment variable naming the create endpoint of a running service.
pub const API_ENTRYPOINT: &str = "API_ENTRYPOINT";

/// REST client for pushing extracted highlights into the service. Extractors
/// assemble their records and submit them as one batch.
pub struct IngestClient {
    endpoint: String,
    http: reqwest::Client,
}

impl IngestClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Reads the endpoint from `API_ENTRYPOINT`.
    pub fn from_env() -> Result<Self> {
        let endpoint =
            env::var(API_ENTRYPOINT).with_context(|| format!("{} is not set", API_ENTRYPOINT))?;
        Ok(Self::new(endpoint))
    }

    /// Submits a batch of highlights and returns the ingest counters.
    pub async fn create_highlights(&self, items: Vec<Highlight>) -> Result<IngestSummary> {
        let payload = CreateHighlights { items };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("create request failed with status {}", status);
        }

        let summary = response
            .json::<IngestSummary>()
            .await
            .context("failed to decode ingest summary")?;

        Ok(summary)
    }
}
