//! AI explanation adapter.
//!
//! Sends the first rows of the merged view plus the user's question to an
//! OpenAI-compatible chat-completion endpoint and hands back the reply
//! verbatim. Any failure collapses into one generic message; there are no
//! retries.

use crate::config::AppConfig;
use crate::data::text::text_block;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Rows of the merged view included in the prompt.
pub const PROMPT_ROWS: usize = 30;
pub const TEMPERATURE: f64 = 0.3;
pub const SYSTEM_PROMPT: &str = "You are a coffee shop AI assistant.";
pub const GENERIC_ERROR: &str = "OpenAI Error. Check API key or billing.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
}

/// Anything that can answer a chat-completion request with plain text.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AssistantError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Llm(format!(
                "LLM API returned {}: {}",
                status, body
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssistantError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AssistantError::Llm("No content in LLM response".to_string()))?;

        Ok(content.to_string())
    }
}

/// User prompt: instructions, the first `PROMPT_ROWS` merged rows as text,
/// then the raw question.
pub fn build_prompt(merged: &DataFrame, question: &str) -> Result<String> {
    let data = text_block(&merged.head(Some(PROMPT_ROWS)))?;
    Ok(format!(
        "You are a helpful coffee shop assistant.\n\
         Answer clearly and briefly using ONLY the dataset below.\n\
         \n\
         DATA:\n\
         {}\n\
         \n\
         QUESTION:\n\
         {}\n",
        data, question
    ))
}

pub fn build_request(model: &str, merged: &DataFrame, question: &str) -> Result<ChatRequest> {
    Ok(ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(merged, question)?),
        ],
        temperature: TEMPERATURE,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Explanation {
    /// No credential configured, or the user turned explanations off.
    Disabled,
    Answer(String),
    Failed,
}

impl Explanation {
    /// Text to show the user, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Explanation::Disabled => None,
            Explanation::Answer(text) => Some(text),
            Explanation::Failed => Some(GENERIC_ERROR),
        }
    }
}

/// Wraps a backend with the enablement rules and failure policy.
#[derive(Clone)]
pub struct ExplanationAdapter {
    backend: Option<Arc<dyn ChatBackend>>,
    model: String,
}

impl ExplanationAdapter {
    /// Enabled only when the config carries a credential.
    pub fn from_config(config: AppConfig) -> Self {
        let backend = config.api_key.map(|key| {
            Arc::new(OpenAiClient::new(key, config.base_url)) as Arc<dyn ChatBackend>
        });
        Self {
            backend,
            model: config.model,
        }
    }

    pub fn with_backend(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend: Some(backend),
            model: model.into(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            model: String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// The user toggle is forced off when no credential is configured.
    pub fn is_active(&self, toggle: bool) -> bool {
        toggle && self.is_enabled()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the backend to explain the data for `question`.
    pub async fn explain(&self, merged: &DataFrame, question: &str, toggle: bool) -> Explanation {
        let Some(backend) = self.backend.as_ref().filter(|_| toggle) else {
            return Explanation::Disabled;
        };

        let request = match build_request(&self.model, merged, question) {
            Ok(request) => request,
            Err(e) => {
                warn!("Failed to build AI prompt: {}", e);
                return Explanation::Failed;
            }
        };

        info!("Requesting AI explanation from model {}", self.model);
        match backend.complete(&request).await {
            Ok(text) => Explanation::Answer(text),
            Err(e) => {
                warn!("AI explanation failed: {}", e);
                Explanation::Failed
            }
        }
    }
}
