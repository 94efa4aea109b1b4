//! HTTP transport for the evaluate endpoint.
//!
//! The retry loop only needs "send this JSON body, give me the status, the
//! `Retry-After` header and the raw body". Keeping that behind a small trait lets
//! tests script responses without a network.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::RETRY_AFTER;

use crate::data::wire::EvaluateRequest;
use crate::error::AppError;

/// Raw outcome of a single POST.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    /// Send one request. Network-level failures are errors; HTTP error statuses are not.
    fn post(&self, request: &EvaluateRequest) -> Result<TransportResponse, AppError>;
}

/// Blocking `reqwest` transport bound to one endpoint URL.
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::remote(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Transport for HttpTransport {
    fn post(&self, request: &EvaluateRequest) -> Result<TransportResponse, AppError> {
        let resp = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| AppError::remote(format!("Evaluate request failed: {e}")))?;

        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp
            .text()
            .map_err(|e| AppError::remote(format!("Failed to read evaluate response body: {e}")))?;

        Ok(TransportResponse {
            status,
            retry_after,
            body,
        })
    }
}
