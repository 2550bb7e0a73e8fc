//! HTTP tracking store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::TrackingError;
use crate::heartbeat::TrackingStore;

/// Per-request timeout; keeps a hung tracker from stalling the schedule for long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct HeartbeatRequest<'a> {
    run_uid: &'a str,
}

/// Reports heartbeats to the tracking web service.
///
/// Sends `POST {base_url}/api/v1/tracking/heartbeat` with `{"run_uid": ...}`.
pub struct WebTrackingStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl WebTrackingStore {
    /// Creates a store for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TrackingError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TrackingError::other(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Authenticates requests with a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Endpoint heartbeats are posted to.
    pub fn endpoint(&self) -> String {
        format!("{}/api/v1/tracking/heartbeat", self.base_url)
    }
}

#[async_trait]
impl TrackingStore for WebTrackingStore {
    fn name(&self) -> &str {
        "api"
    }

    async fn heartbeat(&self, run_id: &str) -> Result<(), TrackingError> {
        let mut req = self
            .client
            .post(self.endpoint())
            .json(&HeartbeatRequest { run_uid: run_id });
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await.map_err(|e| TrackingError::Transport {
            error: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TrackingError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
