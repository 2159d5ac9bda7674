//! ============================================================================
//! Core Types for Tweetsmith
//! ============================================================================
//! The persisted session document and its redacted summary.
//! SessionState is written to disk as camelCase JSON with absent fields
//! omitted, so an empty session is `{}`.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// OAuth state for the single operator identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// PKCE proof for the pending authorization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<String>,
    /// CSRF token for the pending authorization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl SessionState {
    /// Session waiting on the authorization callback
    pub fn pending(code_verifier: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code_verifier: Some(code_verifier.into()),
            state: Some(state.into()),
            ..Self::default()
        }
    }

    /// Session holding a usable token pair
    pub fn authorized(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token,
            ..Self::default()
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.refresh_token.is_some()
    }

    pub fn summary(&self) -> TokenSummary {
        TokenSummary {
            pending_authorization: self.state.is_some() && self.code_verifier.is_some(),
            access_token: self.access_token.as_deref().map(mask_secret),
            refresh_token: self.refresh_token.as_deref().map(mask_secret),
        }
    }
}

/// Redacted view of a session, safe to print or log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenSummary {
    pub pending_authorization: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Keep the first few characters of a secret and hide the rest
pub fn mask_secret(secret: &str) -> String {
    const VISIBLE: usize = 4;
    let prefix: String = secret.chars().take(VISIBLE).collect();
    if secret.chars().count() <= VISIBLE {
        "****".to_string()
    } else {
        format!("{}****", prefix)
    }
}
