//! HTTP client for the Hyperliquid `validatorSummaries` info request.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;

use crate::config::ExporterConfig;
use crate::error::{MonitorError, TransportError};
use crate::validator::{self, ValidatorSummary};

/// Request body understood by the `info` endpoint.
pub const VALIDATOR_SUMMARIES_REQUEST: &str = r#"{"type": "validatorSummaries"}"#;

/// Issues the summaries request against a single endpoint.
#[derive(Debug, Clone)]
pub struct ValidatorApiClient {
    http: reqwest::Client,
    api_url: String,
    timeout: Duration,
}

impl ValidatorApiClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_url: api_url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ExporterConfig) -> Self {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// POST the summaries request and decode the response.
    ///
    /// Both the send and the body read race against `cancel`; a cancelled call
    /// fails with [`TransportError::Cancelled`]. A non-2xx status is a
    /// transport failure and the body is left unread.
    pub async fn fetch_summaries(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ValidatorSummary>, MonitorError> {
        let request = self
            .http
            .post(self.api_url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .body(VALIDATOR_SUMMARIES_REQUEST)
            .build()
            .map_err(MonitorError::RequestConstruction)?;

        tracing::debug!(url = %self.api_url, "requesting validator summaries");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled.into()),
            result = self.http.execute(request) => result.map_err(TransportError::Http)?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status).into());
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled.into()),
            result = response.bytes() => result.map_err(MonitorError::BodyRead)?,
        };

        tracing::debug!(bytes = body.len(), "validator summaries received");

        Ok(validator::decode_summaries(&body)?)
    }
}
