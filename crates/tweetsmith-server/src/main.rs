//! ============================================================================
//! TWEETSMITH :: HTTP Server
//! ============================================================================
//! Routes:
//!   GET /          Links to the two actions
//!   GET /auth      Start Twitter OAuth 2.0 + PKCE
//!   GET /callback  Finish authorization, return the profile
//!   GET /tweet     Refresh tokens, generate promo text, post it
//! ============================================================================

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;
use tweetsmith_core::{AppConfig, FileTokenStore, PromoFlow, SessionStore};

mod errors;
mod routes;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading configuration
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(
                        "tweetsmith=debug,tweetsmith_core=debug,tower_http=info",
                    )
                }),
        )
        .init();

    info!("Starting Tweetsmith");

    let config = AppConfig::from_env()?;

    // The token file must exist before the first request is accepted
    let store = FileTokenStore::open(&config.token_file)?;
    info!("Token store at {}", store.path().display());

    let flow = PromoFlow::new(&config, SessionStore::new(store));
    let app = routes::routes(Arc::new(flow));

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow!("Failed to bind {}: {}", addr, e))?;

    info!("Server running at http://localhost:{}", config.port);
    info!("Twitter redirect URI: {}", config.oauth.redirect_uri);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("Server error: {}", e))?;

    Ok(())
}
