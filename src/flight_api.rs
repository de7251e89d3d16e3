// Flight service client - the real backend behind the flight tools

use crate::error::ExecutionFailure;
use crate::flight_tools::{BookingRequest, FlightBackend, SearchRequest};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for the flight search/booking API
pub struct HttpFlightBackend {
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl HttpFlightBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: ReqwestClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}/", self.base_url, endpoint)
    }

    async fn read_json(&self, request: reqwest::RequestBuilder) -> Result<Value, ExecutionFailure> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ExecutionFailure::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "flight service request failed");
            return Err(ExecutionFailure::NoResult);
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ExecutionFailure::Unreachable(e.to_string()))?;
        debug!(%value, "flight service response");
        Ok(value)
    }
}

#[async_trait]
impl FlightBackend for HttpFlightBackend {
    async fn search_flights(&self, request: &SearchRequest) -> Result<Value, ExecutionFailure> {
        let builder = self.client.get(self.url("search_flights")).query(request);
        self.read_json(builder).await
    }

    async fn book_flight(&self, request: &BookingRequest) -> Result<Value, ExecutionFailure> {
        let builder = self.client.post(self.url("book_flight")).query(request);
        self.read_json(builder).await
    }
}
