// Runtime configuration from environment variables (and .env)

use crate::error::{AgentError, Result};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_FLIGHT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub flight_api_url: String,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();

        let api_key = get("GEMINI_API_KEY").ok_or_else(|| {
            AgentError::Configuration("GEMINI_API_KEY is not set".to_string())
        })?;

        let temperature = match get("GEMINI_TEMPERATURE") {
            Some(raw) => raw.trim().parse::<f32>().map_err(|_| {
                AgentError::Configuration(format!("GEMINI_TEMPERATURE is not a number: {}", raw))
            })?,
            None => 0.4,
        };

        let timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AgentError::Configuration(format!("REQUEST_TIMEOUT_SECS is not a whole number: {}", raw))
            })?,
            None => 120,
        };

        Ok(Self {
            api_key,
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            temperature,
            flight_api_url: get("FLIGHT_API_URL").unwrap_or_else(|| DEFAULT_FLIGHT_API_URL.to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
