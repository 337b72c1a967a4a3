use super::{ChatMessage, LLMConfig, LLMProvider, LLMResponse, LLM};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    total_tokens: u32,
}

fn build_client(config: &LLMConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()?)
}

/// POST an OpenAI-style chat completion and pull out the first choice
async fn send_chat_completion(
    client: &Client,
    endpoint: &str,
    api_key: Option<&str>,
    config: &LLMConfig,
    messages: Vec<ChatMessage>,
    provider_name: &str,
) -> Result<LLMResponse> {
    let request = ChatCompletionRequest {
        model: &config.model,
        messages,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };

    debug!("Sending request to {} at {}", provider_name, endpoint);

    let mut builder = client.post(endpoint).json(&request);
    if let Some(key) = api_key {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }
    let response = builder.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(anyhow!("{} rate limit exceeded: {}", provider_name, text));
        }
        return Err(anyhow!("{} API error {}: {}", provider_name, status, text));
    }

    let completion: ChatCompletionResponse = response.json().await?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No response from {}", provider_name))?
        .message
        .content;

    Ok(LLMResponse {
        content,
        tokens_used: completion.usage.map(|u| u.total_tokens),
    })
}

/// OpenAI provider implementation
pub struct OpenAIProvider {
    config: LLMConfig,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(anyhow!("OpenAI API key required"));
        }

        let client = build_client(&config)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl LLM for OpenAIProvider {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OpenAI API key not configured"))?;
        let endpoint = self.config.endpoint.as_deref().unwrap_or(OPENAI_CHAT_URL);

        send_chat_completion(&self.client, endpoint, Some(api_key), &self.config, messages, "OpenAI").await
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::OpenAI
    }
}

/// LM Studio (local OpenAI-compatible server) provider implementation
pub struct LMStudioProvider {
    config: LLMConfig,
    client: Client,
}

impl LMStudioProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.endpoint.is_none() {
            return Err(anyhow!("LMStudio endpoint required"));
        }

        let client = build_client(&config)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl LLM for LMStudioProvider {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or_else(|| anyhow!("LMStudio endpoint not configured"))?;

        send_chat_completion(
            &self.client,
            endpoint,
            self.config.api_key.as_deref(),
            &self.config,
            messages,
            "LMStudio",
        )
        .await
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::LMStudio
    }
}
