//! ============================================================================
//! Promo Flow - Authorization, refresh, generation and publishing
//! ============================================================================
//! Authorization:  START -> PENDING {codeVerifier, state}
//!                 PENDING -> AUTHORIZED {accessToken, refreshToken}
//! Posting:        refresh (rotate + persist) -> generate -> publish
//!
//! Every read-modify-write of the session runs under the store's write gate.
//! ============================================================================

use anyhow::anyhow;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::TwitterOAuth;
use crate::config::AppConfig;
use crate::executor::{CompletionExecutor, TwitterExecutor};
use crate::prompt::PromptVariant;
use crate::store::SessionStore;
use crate::types::SessionState;

/// Failure of a flow step, split into operator mistakes and upstream trouble
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Stored tokens do not match!")]
    StateMismatch,

    #[error("Authorization was denied: {0}")]
    AuthorizationDenied(String),

    #[error("Callback is missing the authorization code")]
    MissingCode,

    #[error("No refresh token found. Please authenticate first.")]
    NotAuthorized,

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl FlowError {
    /// True for errors caused by the caller rather than an upstream service
    pub fn is_client_error(&self) -> bool {
        !matches!(self, FlowError::Upstream(_))
    }
}

/// Query parameters Twitter appends to the redirect URI
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// The three operations behind the HTTP surface
pub struct PromoFlow {
    sessions: SessionStore,
    oauth: TwitterOAuth,
    completion: CompletionExecutor,
    prompt: PromptVariant,
    api_base: String,
    http: reqwest::Client,
}

impl PromoFlow {
    pub fn new(config: &AppConfig, sessions: SessionStore) -> Self {
        let http = reqwest::Client::new();
        Self {
            sessions,
            oauth: TwitterOAuth::with_client(config.oauth.clone(), http.clone()),
            completion: CompletionExecutor::with_client(config.completion.clone(), http.clone()),
            prompt: config.prompt.clone(),
            api_base: config.api_base.clone(),
            http,
        }
    }

    /// Begin authorization: persist a fresh verifier/state pair, replacing
    /// any pending one, and return the consent URL.
    pub async fn start_authorization(&self) -> Result<String, FlowError> {
        let request = self.oauth.authorization_request()?;

        let _guard = self.sessions.lock().await;
        self.sessions
            .save(&SessionState::pending(&request.code_verifier, &request.state))
            .await?;

        info!("Authorization started, redirecting to consent screen");
        Ok(request.url)
    }

    /// Finish authorization and return the authenticated profile
    pub async fn complete_authorization(
        &self,
        params: CallbackParams,
    ) -> Result<serde_json::Value, FlowError> {
        let tokens = {
            let _guard = self.sessions.lock().await;
            let stored = self.sessions.load().await;

            let state_matches = matches!(
                (params.state.as_deref(), stored.state.as_deref()),
                (Some(received), Some(expected)) if received == expected
            );
            if !state_matches {
                warn!("OAuth state mismatch on callback");
                return Err(FlowError::StateMismatch);
            }

            if let Some(error) = params.error {
                let description = params
                    .error_description
                    .unwrap_or_else(|| "Unknown error".to_string());
                warn!("Twitter OAuth error: {} - {}", error, description);
                return Err(FlowError::AuthorizationDenied(format!(
                    "{} - {}",
                    error, description
                )));
            }

            let code = params.code.ok_or(FlowError::MissingCode)?;
            let verifier = stored
                .code_verifier
                .ok_or_else(|| anyhow!("No PKCE verifier stored for the pending authorization"))?;

            let tokens = self.oauth.exchange_code(&code, &verifier).await?;
            self.sessions
                .save(&SessionState::authorized(
                    &tokens.access_token,
                    tokens.refresh_token.clone(),
                ))
                .await?;
            tokens
        };

        info!("Authorization complete, tokens stored");

        let profile = TwitterExecutor::with_client(
            self.http.clone(),
            self.api_base.as_str(),
            tokens.access_token,
        )
        .me()
        .await?;

        Ok(profile)
    }

    /// Rotate the stored refresh token and return the new access token.
    /// The store is only written after the platform accepts the refresh.
    pub async fn refresh_session(&self) -> Result<String, FlowError> {
        let _guard = self.sessions.lock().await;

        let stored = self.sessions.load().await;
        let refresh_token = stored.refresh_token.ok_or(FlowError::NotAuthorized)?;

        let tokens = self.oauth.refresh_tokens(&refresh_token).await?;

        if tokens.refresh_token.is_none() {
            warn!("Refresh response carried no new refresh token");
        }

        self.sessions
            .save(&SessionState::authorized(
                &tokens.access_token,
                tokens.refresh_token,
            ))
            .await?;

        Ok(tokens.access_token)
    }

    /// Refresh, generate promo text and publish it. Returns the platform's
    /// post data.
    pub async fn post_promo(&self) -> Result<serde_json::Value, FlowError> {
        let access_token = self.refresh_session().await?;

        let text = self.completion.generate(&self.prompt, Utc::now()).await?;

        let post = TwitterExecutor::with_client(self.http.clone(), self.api_base.as_str(), access_token)
            .post_tweet(&text)
            .await?;

        Ok(post)
    }
}
