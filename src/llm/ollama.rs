//! Ollama-backed score provider.
//!
//! Talks to the `/api/chat` endpoint in JSON mode, one request per project
//! plus one for the portfolio summary.

use super::prompts::{self, SYSTEM_PROMPT};
use super::provider::{
    PortfolioBrief, PortfolioNarrative, ProjectAssessment, ProjectBrief, ScoreProvider,
};
use crate::config::ModelConfig;
use crate::error::ProviderError;
use crate::report::Language;
use anyhow::{Context, Result};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// First backoff delay; doubles per retry up to [`RETRY_MAX_DELAY`].
const RETRY_MIN_DELAY: Duration = Duration::from_millis(500);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(8);

/// Connection settings for the Ollama provider.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    /// Extra attempts after a retryable failure.
    pub retries: usize,
    /// Language the model writes its text in.
    pub language: Language,
}

impl OllamaConfig {
    pub fn from_model_config(model: &ModelConfig, language: Language) -> Self {
        Self {
            ollama_url: model.ollama_url.trim_end_matches('/').to_string(),
            model_name: model.name.clone(),
            temperature: model.temperature,
            timeout_seconds: model.timeout_seconds,
            retries: model.retries,
            language,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    format: &'static str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Score provider backed by a local or remote Ollama server.
pub struct OllamaProvider {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Send one chat request, retrying transport failures.
    async fn chat(&self, prompt: String) -> Result<String, ProviderError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(RETRY_MIN_DELAY)
            .with_max_delay(RETRY_MAX_DELAY)
            .with_max_times(self.config.retries);

        (|| self.send_chat(&prompt))
            .retry(backoff)
            .when(ProviderError::is_retryable)
            .notify(|e: &ProviderError, delay: Duration| {
                warn!("Model request failed ({}), retrying in {:?}", e, delay);
            })
            .await
    }

    async fn send_chat(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/chat", self.config.ollama_url);

        let request = OllamaChatRequest {
            model: &self.config.model_name,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            format: "json",
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    ProviderError::Connect(self.config.ollama_url.clone())
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(chat_response.message.content)
    }
}

#[async_trait]
impl ScoreProvider for OllamaProvider {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    async fn score_project(&self, brief: &ProjectBrief) -> Result<ProjectAssessment, ProviderError> {
        debug!("Scoring project {} ({})", brief.name(), brief.id());
        let reply = self
            .chat(prompts::project_prompt(brief, self.config.language))
            .await?;
        prompts::parse_assessment(&reply)
    }

    async fn summarize(&self, brief: &PortfolioBrief) -> Result<PortfolioNarrative, ProviderError> {
        debug!(
            "Requesting portfolio summary for {} projects",
            brief.projects.len()
        );
        let reply = self
            .chat(prompts::portfolio_prompt(brief, self.config.language))
            .await?;
        prompts::parse_narrative(&reply)
    }
}
