//! Delivery of contact payloads to the hosted form relay.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use site_shared::{error::SubmitError, protocol::ContactPayload};
use tracing::debug;

#[async_trait]
pub trait FormRelay: Send + Sync {
    /// Sends one payload. `Ok` means the relay answered with a 2xx status.
    async fn deliver(&self, payload: &ContactPayload) -> Result<(), SubmitError>;
}

/// Relay used when no endpoint has been wired up.
pub struct MissingFormRelay;

#[async_trait]
impl FormRelay for MissingFormRelay {
    async fn deliver(&self, _payload: &ContactPayload) -> Result<(), SubmitError> {
        Err(SubmitError::Transport(
            "form relay endpoint is unavailable".to_string(),
        ))
    }
}

pub struct HttpFormRelay {
    http: Client,
    endpoint: String,
}

impl HttpFormRelay {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Like [`HttpFormRelay::new`], but every request is abandoned after `timeout`.
    pub fn with_timeout(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SubmitError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SubmitError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl FormRelay for HttpFormRelay {
    async fn deliver(&self, payload: &ContactPayload) -> Result<(), SubmitError> {
        let res = self
            .http
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = res.status();
        debug!(endpoint = %self.endpoint, status = status.as_u16(), "form relay responded");
        if status.is_success() {
            Ok(())
        } else {
            Err(SubmitError::Status(status.as_u16()))
        }
    }
}

fn map_transport_error(err: reqwest::Error) -> SubmitError {
    if err.is_timeout() {
        SubmitError::Timeout
    } else {
        SubmitError::Transport(err.to_string())
    }
}

#[cfg(test)]
#[path = "tests/relay_tests.rs"]
mod tests;
