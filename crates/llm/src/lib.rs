use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use giftfinder_config::LlmConfig;

mod suggestions;

pub use suggestions::SuggestionGenerator;

/// A remote text-completion service: one prompt in, one free-text block out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl From<&LlmConfig> for CompletionParams {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
        }
    }
}

impl CompletionParams {
    fn payload(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "prompt": prompt,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "top_p": self.top_p,
            "frequency_penalty": self.frequency_penalty,
            "presence_penalty": self.presence_penalty,
        })
    }
}

/// Client for the OpenAI-compatible `/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    params: CompletionParams,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            params: CompletionParams::from(config),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.params.payload(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("completion API error ({status}): {body}");
        }

        let body: serde_json::Value = response.json().await?;
        let text = completion_text(&body)?;
        debug!(
            model = %self.params.model,
            prompt_len = prompt.len(),
            reply_len = text.len(),
            "completion received"
        );
        Ok(text)
    }
}

/// Pull `choices[0].text` out of a completions response body.
fn completion_text(body: &serde_json::Value) -> Result<String> {
    match body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("text"))
        .and_then(|text| text.as_str())
    {
        Some(text) => Ok(text.to_string()),
        None => bail!("completion response missing text: {body}"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
