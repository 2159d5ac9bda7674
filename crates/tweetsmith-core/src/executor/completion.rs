//! ============================================================================
//! Completion Executor - Promo text via a chat-completions API
//! ============================================================================
//! Talks to any OpenAI-compatible endpoint; Groq by default. The first
//! choice is returned verbatim with no length or hashtag checks.
//! ============================================================================

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::CompletionConfig;
use crate::prompt::{ChatMessage, PromptVariant};

/// Executor for text generation
pub struct CompletionExecutor {
    client: reqwest::Client,
    config: CompletionConfig,
}

impl CompletionExecutor {
    /// Create a new CompletionExecutor
    pub fn new(config: CompletionConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: CompletionConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    /// Generate promo text for the given prompt variant
    pub async fn generate(&self, variant: &PromptVariant, now: DateTime<Utc>) -> Result<String> {
        info!("Generating promo text ({} prompt)", variant.name());

        let text = self.call_api(variant.messages(now)).await?;

        info!("Generated {} chars", text.chars().count());
        Ok(text)
    }

    /// Call the chat completions API
    async fn call_api(&self, messages: Vec<ChatMessage>) -> Result<String> {
        debug!(
            "Calling completion API with {} messages, model {}",
            messages.len(),
            self.config.model
        );

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: Some(self.config.max_tokens),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to call completion API: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Completion API error {}: {}", status, body));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse completion response: {}", e))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("No choices in completion response"))
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
