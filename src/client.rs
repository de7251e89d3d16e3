// Model client - Gemini generateContent over REST

use crate::error::{AgentError, Result};
use crate::protocol::{Content, GenerateContentResponse};
use crate::tools::ToolSet;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// A hosted model that continues a conversation
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Sends the whole conversation so far and returns the next model reply.
    async fn generate(&self, contents: &[Content]) -> Result<GenerateContentResponse>;
}

/// Gemini client with a tool set and generation config bound at creation
pub struct ModelClient {
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    timeout: Duration,
    tools: ToolSet,
    client: ReqwestClient,
}

impl ModelClient {
    pub fn new(api_key: String, model: String, tools: ToolSet) -> Self {
        Self::new_with_config(
            api_key,
            model,
            "https://generativelanguage.googleapis.com/v1beta".to_string(),
            tools,
        )
    }

    pub fn new_with_config(api_key: String, model: String, base_url: String, tools: ToolSet) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: 0.4,
            timeout: Duration::from_secs(120),
            tools,
            client: ReqwestClient::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(&self, contents: &[Content]) -> Value {
        let mut body = json!({
            "contents": contents,
            "generationConfig": { "temperature": self.temperature }
        });
        if !self.tools.is_empty() {
            body["tools"] = json!([self.tools.to_wire()]);
        }
        body
    }
}

#[async_trait]
impl GenerativeModel for ModelClient {
    async fn generate(&self, contents: &[Content]) -> Result<GenerateContentResponse> {
        let body = self.request_body(contents);
        debug!(model = %self.model, turns = contents.len(), "sending generateContent");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateContentResponse = response.json().await?;
        debug!(candidates = reply.candidates.len(), "received generateContent reply");
        Ok(reply)
    }
}
