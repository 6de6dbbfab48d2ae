//! [`RemoteReasoningClient`] – OpenAI-compatible chat client with model
//! failover.
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint (OpenRouter in
//! the usual deployment) and walks a prioritized model list: the primary
//! model first, then each fallback. Per model the client retries transient
//! failures with capped exponential backoff, but a rate-limit response moves
//! straight to the next model and a not-found response removes the model for
//! the rest of the session. Only when every model has failed does the call
//! error out, so the pipeline can fail over to local behaviors quickly
//! instead of burning the whole retry budget on a dead model.
//!
//! Reasoning models sometimes wrap their answer in `<think>` / `<thought>`
//! tags; the client strips those before handing the payload back.

use std::collections::HashSet;
use std::time::Duration;

use hexos_types::ActionCommand;
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum RemoteReasoningError {
    /// No API key configured; the client cannot be used.
    #[error("remote reasoning is not configured (missing API key)")]
    NotConfigured,
    /// Every candidate model failed.
    #[error("all remote models failed; last error: {last}")]
    Exhausted { last: String },
    /// The response body did not have the expected chat-completion shape.
    #[error("unexpected response format: {0}")]
    BadResponse(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Message types (OpenAI-compatible)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: serde_json::Value,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Connection settings for the remote reasoner.
#[derive(Debug, Clone)]
pub struct RemoteReasoningConfig {
    pub base_url: String,
    /// Bearer token; `None` means the client is unconfigured.
    pub api_key: Option<String>,
    /// Primary model first, fallbacks after, tried in order.
    pub models: Vec<String>,
    pub timeout: Duration,
    /// Retries per model for transient failures.
    pub max_retries: u32,
    pub temperature: f32,
}

impl Default for RemoteReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: None,
            models: vec!["mistralai/devstral-small:free".to_string()],
            timeout: Duration::from_secs(20),
            max_retries: 2,
            temperature: 0.2,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Async chat client. Construct once and reuse across ticks; the session
/// keeps the set of models already found dead.
pub struct RemoteReasoningClient {
    config: RemoteReasoningConfig,
    client: reqwest::Client,
    /// Models that returned 404 this session; never tried again.
    dead_models: HashSet<String>,
}

impl RemoteReasoningClient {
    pub fn new(config: RemoteReasoningConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self {
            config,
            client,
            dead_models: HashSet::new(),
        }
    }

    /// Whether the client holds credentials and at least one live model.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
            && self
                .config
                .models
                .iter()
                .any(|m| !self.dead_models.contains(m))
    }

    /// Send `messages` and return the assistant's reply text, already
    /// stripped of reasoning tags.
    ///
    /// # Errors
    ///
    /// [`RemoteReasoningError::NotConfigured`] without an API key;
    /// [`RemoteReasoningError::Exhausted`] when every candidate model fails.
    pub async fn chat(&mut self, messages: &[ChatMessage]) -> Result<String, RemoteReasoningError> {
        let Some(api_key) = self.config.api_key.clone() else {
            return Err(RemoteReasoningError::NotConfigured);
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let schema =
            serde_json::to_value(schema_for!(ActionCommand)).unwrap_or(serde_json::Value::Null);

        let mut last_err = String::from("no models configured");
        let candidates: Vec<String> = self
            .config
            .models
            .iter()
            .filter(|m| !self.dead_models.contains(*m))
            .cloned()
            .collect();

        for model in candidates {
            for attempt in 0..=self.config.max_retries {
                info!(model, attempt, "querying remote reasoner");
                let body = ChatRequest {
                    model: &model,
                    messages,
                    temperature: self.config.temperature,
                    stream: false,
                    response_format: ResponseFormat {
                        kind: "json_schema",
                        json_schema: schema.clone(),
                    },
                };

                let sent = self
                    .client
                    .post(&url)
                    .bearer_auth(&api_key)
                    .json(&body)
                    .send()
                    .await;

                match sent {
                    Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                        warn!(model, "rate limited; failing over to next model");
                        last_err = format!("{model}: rate limited");
                        break;
                    }
                    Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => {
                        warn!(model, "model not found; skipping for this session");
                        self.dead_models.insert(model.clone());
                        last_err = format!("{model}: not found");
                        break;
                    }
                    Ok(resp) => match resp.error_for_status() {
                        Ok(resp) => match resp.json::<ChatResponse>().await {
                            Ok(parsed) => {
                                return parsed
                                    .choices
                                    .into_iter()
                                    .next()
                                    .map(|c| strip_reasoning_tags(&c.message.content).to_string())
                                    .ok_or_else(|| {
                                        RemoteReasoningError::BadResponse(
                                            "empty choices array".into(),
                                        )
                                    });
                            }
                            Err(err) => last_err = format!("{model}: {err}"),
                        },
                        Err(err) => last_err = format!("{model}: {err}"),
                    },
                    Err(err) => last_err = format!("{model}: {err}"),
                }

                if attempt < self.config.max_retries {
                    let backoff = Duration::from_secs_f32(0.5 * 2f32.powi(attempt as i32));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        Err(RemoteReasoningError::Exhausted { last: last_err })
    }
}

/// Drop `<think>` / `<thought>` preambles emitted by reasoning models,
/// keeping only the text after the last closing tag. An unclosed `<think>`
/// keeps whatever follows the opening tag.
fn strip_reasoning_tags(content: &str) -> &str {
    if let Some((_, rest)) = content.rsplit_once("</thought>") {
        rest.trim()
    } else if let Some((_, rest)) = content.rsplit_once("</think>") {
        rest.trim()
    } else if let Some((_, rest)) = content.rsplit_once("<think>") {
        rest.trim()
    } else {
        content.trim()
    }
}
