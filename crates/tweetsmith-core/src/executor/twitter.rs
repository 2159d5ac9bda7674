//! ============================================================================
//! Twitter Executor - Profile and Posting via Twitter API v2
//! ============================================================================
//! Uses an OAuth 2.0 user access token as a Bearer credential:
//! - Look up the authenticated user
//! - Post a single tweet
//! Responses are handed back as the platform's `data` object, untouched.
//! ============================================================================

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::{debug, info};

/// Executor for Twitter API calls made on behalf of the operator
pub struct TwitterExecutor {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl TwitterExecutor {
    /// Create a new TwitterExecutor with OAuth 2.0 access token
    pub fn new(api_base: impl Into<String>, access_token: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_base, access_token)
    }

    pub fn with_client(
        client: reqwest::Client,
        api_base: impl Into<String>,
        access_token: String,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// Fetch the authenticated user's profile
    pub async fn me(&self) -> Result<serde_json::Value> {
        debug!("Fetching authenticated user");

        let response = self
            .client
            .get(format!("{}/2/users/me", self.api_base))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to fetch profile: {}", e))?;

        let data = Self::data_from(response, "profile").await?;

        if let Some(username) = data.get("username").and_then(|u| u.as_str()) {
            info!("Authenticated as @{}", username);
        }

        Ok(data)
    }

    /// Post a single tweet. The text is sent as-is; the platform decides
    /// whether it fits.
    pub async fn post_tweet(&self, text: &str) -> Result<serde_json::Value> {
        info!("Posting tweet: {}...", text.chars().take(50).collect::<String>());

        let body = serde_json::json!({
            "text": text
        });

        let response = self
            .client
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to post tweet: {}", e))?;

        let data = Self::data_from(response, "tweet").await?;

        if let Some(id) = data.get("id").and_then(|id| id.as_str()) {
            info!("Tweet posted: https://twitter.com/i/status/{}", id);
        }

        Ok(data)
    }

    async fn data_from(response: reqwest::Response, what: &str) -> Result<serde_json::Value> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Twitter API error {}: {}", status, body));
        }

        let envelope: DataEnvelope = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse {} response: {}", what, e))?;

        envelope
            .data
            .ok_or_else(|| anyhow!("Twitter {} response has no data", what))
    }
}

// ============================================================================
// Twitter API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct DataEnvelope {
    data: Option<serde_json::Value>,
}
