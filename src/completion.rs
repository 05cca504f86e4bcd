use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Fixed instruction sent with every request; the assistant mirrors the
/// user's language and defaults to Indonesian.
const SYSTEM_PROMPT: &str = "Kamu adalah asisten AI yang membantu dan ramah. \
    Jawab dalam bahasa Indonesia kecuali user bertanya dalam bahasa lain.";

const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f64 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("API key ditolak oleh provider (HTTP 401)")]
    Unauthorized,
    #[error("terlalu banyak permintaan atau quota habis (HTTP 429)")]
    RateLimited,
    #[error("server provider bermasalah (HTTP {0})")]
    ServerFault(u16),
    #[error("tidak dapat terhubung ke provider: {0}")]
    NetworkUnreachable(String),
    #[error("kesalahan tidak terduga: {0}")]
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Thin client for an OpenAI-compatible chat-completion endpoint. One shot
/// per call: no retries, 30s deadline, and only the newest user message is
/// sent alongside the fixed system prompt.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl CompletionClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for completion API")?;

        Ok(Self {
            http,
            api_base,
            api_key,
            model,
        })
    }

    pub async fn complete(&self, user_message: &str) -> Result<String, CompletionError> {
        let request_body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_message }
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        let url = format!("{}/chat/completions", self.api_base);
        tracing::debug!("Calling completion API at {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Completion API error: HTTP {} - {}", status, body);
            return Err(classify_status(status.as_u16(), body));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Unknown(format!("invalid response body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| CompletionError::Unknown("response contained no choices".to_string()))
    }
}

fn classify_status(status: u16, body: String) -> CompletionError {
    match status {
        401 => CompletionError::Unauthorized,
        429 => CompletionError::RateLimited,
        500..=599 => CompletionError::ServerFault(status),
        _ => CompletionError::Unknown(format!("HTTP {status}: {body}")),
    }
}

fn classify_transport_error(error: reqwest::Error) -> CompletionError {
    if error.is_connect() || error.is_timeout() {
        CompletionError::NetworkUnreachable(error.to_string())
    } else {
        CompletionError::Unknown(error.to_string())
    }
}
