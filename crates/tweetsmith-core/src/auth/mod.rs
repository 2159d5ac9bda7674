//! ============================================================================
//! Auth Module - OAuth and Authentication Flows
//! ============================================================================
//! Handles authentication against the Twitter API:
//! - OAuth 2.0 authorization code + PKCE
//! - Refresh token rotation
//! ============================================================================

mod twitter_oauth;

pub use twitter_oauth::{AuthorizationRequest, TwitterOAuth, TwitterTokens};
