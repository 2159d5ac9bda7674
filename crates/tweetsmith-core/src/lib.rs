//! ============================================================================
//! TWEETSMITH-CORE: OAuth, Token Storage, Generation and Publishing
//! ============================================================================
//! This crate handles all backend logic for the Tweetsmith server:
//! - Twitter OAuth 2.0 + PKCE authorization and refresh token rotation
//! - Single-file JSON token store behind a swappable interface
//! - Promo text generation via an OpenAI-compatible completion API
//! - Publishing through the Twitter API v2
//! ============================================================================

pub mod auth;
pub mod config;
pub mod executor;
pub mod flow;
pub mod prompt;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::{AppConfig, CompletionConfig, OAuthConfig};
pub use flow::{CallbackParams, FlowError, PromoFlow};
pub use prompt::{BrandVoice, PromptVariant};
pub use store::{FileTokenStore, MemoryTokenStore, SessionStore, TokenStore};
pub use types::{SessionState, TokenSummary};
