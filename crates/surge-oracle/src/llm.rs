//! Chat-completions backed oracle.
//!
//! Sends a system + user prompt describing the market context and expects
//! a JSON object `{newPrice, reasoning, decision}` in the first choice.

use crate::context::PricingContext;
use crate::decision::OracleDecision;
use crate::error::{OracleError, OracleResult};
use crate::oracle::DecisionOracle;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use surge_core::BoxFuture;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are a pricing analyst for an online store. \
Given the market context, propose a new price. Never price below the base price, \
never move more than the maximum change per update, and keep at least the minimum \
margin below a competitor you match. Respond with a single JSON object: \
{\"newPrice\": number, \"reasoning\": string, \"decision\": \"increase\"|\"decrease\"|\"hold\"}.";

/// LLM oracle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmOracleConfig {
    /// Chat-completions URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "SURGE_ORACLE_API_KEY".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for LlmOracleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Network-backed oracle.
pub struct LlmOracle {
    client: Client,
    config: LlmOracleConfig,
    /// Resolved at construction; absence surfaces on every request.
    api_key: Option<String>,
}

impl LlmOracle {
    /// Build from config, reading the API key from `config.api_key_env`.
    pub fn from_env(config: LlmOracleConfig) -> OracleResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::new(config, api_key)
    }

    pub fn new(config: LlmOracleConfig, api_key: Option<String>) -> OracleResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| OracleError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn call(&self, context: &PricingContext) -> OracleResult<OracleDecision> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            OracleError::MissingCredentials(format!("{} is not set", self.config.api_key_env))
        })?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(context)?,
                },
            ],
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(OracleError::MissingCredentials(format!(
                "oracle rejected credentials (HTTP {status})"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(format!("Failed to parse response: {e}")))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::Malformed("response has no content".to_string()))?;

        debug!(model = %self.config.model, "Oracle response received");
        OracleDecision::from_text(&content)
    }
}

impl DecisionOracle for LlmOracle {
    fn name(&self) -> &str {
        "llm"
    }

    fn request_pricing_decision<'a>(
        &'a self,
        context: &'a PricingContext,
    ) -> BoxFuture<'a, OracleResult<OracleDecision>> {
        Box::pin(self.call(context))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> OracleError {
    if e.is_timeout() {
        OracleError::Timeout
    } else {
        OracleError::Transport(e.to_string())
    }
}

/// Render the context as the user message.
pub fn user_prompt(context: &PricingContext) -> OracleResult<String> {
    let json = serde_json::to_string_pretty(context)
        .map_err(|e| OracleError::Malformed(format!("Failed to encode context: {e}")))?;
    Ok(format!(
        "Market context:\n{json}\n\nPropose the new price for this {} signal.",
        context.signal.signal_type
    ))
}
