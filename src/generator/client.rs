//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::response::{parse_generation, GenerationResult};
use super::IdeaGenerator;
use crate::config::LlmConfig;
use crate::error::GenerationError;

const SYSTEM_PROMPT: &str = "You are an expert in digital products and micro-SaaS businesses. \
Reply with a single JSON object and nothing else.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

/// Chat completions client bound to one model
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    api_key: String,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(api_key: String, config: LlmConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        Ok(Self { client, api_key, config })
    }

    /// Build a client using the configured API key
    pub fn from_keyring(config: LlmConfig) -> anyhow::Result<Self> {
        let api_key = crate::security::get_api_key()?;
        Ok(Self::new(api_key, config)?)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one user prompt and return the assistant's text
    pub async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.config.temperature,
            response_format: ResponseFormat { r#type: "json_object" },
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api { status, body: crate::truncate_safe(&body, 500) });
        }

        let body = response.text().await.map_err(|e| self.request_error(e))?;
        tracing::debug!("LLM response: {}", crate::truncate_safe(&body, 2000));

        let raw: Value = serde_json::from_str(&body).map_err(|e| {
            GenerationError::InvalidJson(format!(
                "{} (body: {})",
                e,
                crate::truncate_safe(&body, 500)
            ))
        })?;

        Ok(message_content(&raw))
    }

    fn request_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.config.timeout_secs)
        } else {
            GenerationError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl IdeaGenerator for ChatClient {
    async fn generate(&self, prompt: &str) -> Result<GenerationResult, GenerationError> {
        let content = self.complete(prompt).await?;
        parse_generation(&content)
    }
}

/// Text of the first choice; content may be a string or a list of parts.
fn message_content(raw: &Value) -> String {
    let content = raw
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"));

    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}
