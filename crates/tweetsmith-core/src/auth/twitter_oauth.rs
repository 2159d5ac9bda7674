//! ============================================================================
//! Twitter OAuth 2.0 + PKCE Authentication
//! ============================================================================
//! Implements the OAuth 2.0 authorization code flow with PKCE for Twitter.
//! Public clients send their client_id in the form body; confidential
//! clients (client secret configured) authenticate with HTTP Basic.
//! ============================================================================

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};
use url::Url;

use crate::config::OAuthConfig;
use crate::types::mask_secret;

/// Everything needed to send the operator to the consent screen
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub code_verifier: String,
    pub state: String,
}

/// OAuth 2.0 tokens for Twitter API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Twitter OAuth 2.0 client
pub struct TwitterOAuth {
    config: OAuthConfig,
    client: Client,
}

impl TwitterOAuth {
    /// Create a new Twitter OAuth client
    pub fn new(config: OAuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: OAuthConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Generate PKCE code verifier and challenge
    fn generate_pkce() -> (String, String) {
        // Generate random 64-char verifier using allowed characters
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
        let verifier: String = (0..64)
            .map(|_| {
                let idx = rand::random::<usize>() % CHARSET.len();
                CHARSET[idx] as char
            })
            .collect();

        (verifier.clone(), pkce_challenge(&verifier))
    }

    /// Generate a random state parameter for CSRF protection
    fn generate_state() -> String {
        (0..32)
            .map(|_| format!("{:02x}", rand::random::<u8>()))
            .collect()
    }

    /// Build a fresh authorization URL with its verifier and state
    pub fn authorization_request(&self) -> Result<AuthorizationRequest> {
        let (verifier, challenge) = Self::generate_pkce();
        let state = Self::generate_state();

        let mut url = Url::parse(&self.config.authorize_url).map_err(|e| {
            anyhow!(
                "Invalid authorize URL '{}': {}",
                self.config.authorize_url,
                e
            )
        })?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", &state)
            .append_pair("code_challenge", &challenge)
            .append_pair("code_challenge_method", "S256");

        debug!("Generated auth URL with state: {}", mask_secret(&state));

        Ok(AuthorizationRequest {
            url: url.into(),
            code_verifier: verifier,
            state,
        })
    }

    /// Exchange authorization code for access tokens
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TwitterTokens> {
        info!("Exchanging authorization code for tokens");

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", verifier),
        ];

        let tokens = self.token_request(&params, "Token exchange").await?;

        info!(
            "Successfully obtained tokens, expires in {} seconds",
            tokens.expires_in.unwrap_or_default()
        );

        Ok(tokens)
    }

    /// Trade a refresh token for a new access/refresh pair
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<TwitterTokens> {
        info!("Refreshing tokens");

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];

        let tokens = self.token_request(&params, "Token refresh").await?;

        info!("Successfully refreshed tokens");
        Ok(tokens)
    }

    async fn token_request(&self, params: &[(&str, &str)], what: &str) -> Result<TwitterTokens> {
        let mut request = self.client.post(&self.config.token_url).form(params);

        if let Some(secret) = &self.config.client_secret {
            request = request.basic_auth(&self.config.client_id, Some(secret));
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow!("{} request failed: {}", what, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("{} failed: {} - {}", what, status, error_text);
            return Err(anyhow!("{} failed ({}): {}", what, status, error_text));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse {} response: {}", what.to_lowercase(), e))
    }
}

/// S256 challenge for a PKCE verifier
pub(crate) fn pkce_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
