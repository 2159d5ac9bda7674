//! ============================================================================
//! Configuration - Built once at startup from the environment
//! ============================================================================
//! Every collaborator receives its slice of AppConfig explicitly. Nothing
//! else in the crate reads environment variables.
//! ============================================================================

use anyhow::{anyhow, Result};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use crate::prompt::{BrandVoice, PromptVariant};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_TOKEN_FILE: &str = "data/tokens.json";

pub const TWITTER_AUTH_URL: &str = "https://twitter.com/i/oauth2/authorize";
pub const TWITTER_API_BASE: &str = "https://api.twitter.com";

/// Scopes needed to read the profile, post, and receive a refresh token
pub const TWITTER_SCOPES: &[&str] = &["tweet.read", "tweet.write", "users.read", "offline.access"];

pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const GROQ_MODEL: &str = "llama3-8b-8192";
pub const GROQ_MAX_TOKENS: u32 = 64;

/// Twitter OAuth 2.0 client settings
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    /// Set for confidential clients; sent via HTTP Basic auth
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
}

/// Chat-completion endpoint settings
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub token_file: PathBuf,
    pub api_base: String,
    pub oauth: OAuthConfig,
    pub completion: CompletionConfig,
    pub prompt: PromptVariant,
}

impl AppConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).ok_or_else(|| anyhow!("{} must be set", key));

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| anyhow!("PORT must be a port number, got '{}': {}", raw, e))?,
            None => DEFAULT_PORT,
        };

        let api_base = get("TWITTER_API_BASE")
            .unwrap_or_else(|| TWITTER_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let oauth = OAuthConfig {
            client_id: require("TWITTER_CLIENT_ID")?,
            client_secret: get("TWITTER_CLIENT_SECRET"),
            redirect_uri: get("TWITTER_CALLBACK_URL")
                .unwrap_or_else(|| format!("http://localhost:{}/callback", port)),
            authorize_url: get("TWITTER_AUTH_URL").unwrap_or_else(|| TWITTER_AUTH_URL.to_string()),
            token_url: get("TWITTER_TOKEN_URL")
                .unwrap_or_else(|| format!("{}/2/oauth2/token", api_base)),
            scopes: TWITTER_SCOPES.iter().map(|s| s.to_string()).collect(),
        };

        let max_tokens = match get("GROQ_MAX_TOKENS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| anyhow!("GROQ_MAX_TOKENS must be a number, got '{}': {}", raw, e))?,
            None => GROQ_MAX_TOKENS,
        };

        let completion = CompletionConfig {
            api_url: get("GROQ_API_URL").unwrap_or_else(|| GROQ_API_URL.to_string()),
            api_key: require("GROQ_API_KEY")?,
            model: get("GROQ_MODEL").unwrap_or_else(|| GROQ_MODEL.to_string()),
            max_tokens,
        };

        let prompt = match get("PROMPT_VARIANT").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("basic") => PromptVariant::Basic,
            Some("branded") => PromptVariant::Branded(brand_from(&get)?),
            Some(other) => {
                return Err(anyhow!(
                    "PROMPT_VARIANT must be 'basic' or 'branded', got '{}'",
                    other
                ))
            }
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            token_file: PathBuf::from(
                get("TOKEN_FILE").unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string()),
            ),
            api_base,
            oauth,
            completion,
            prompt,
        })
    }

    /// Socket address the server binds to. HOST may be an IPv4/IPv6
    /// literal or a resolvable name such as `localhost`.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| anyhow!("Invalid listen address {}:{}: {}", self.host, self.port, e))?
            .next()
            .ok_or_else(|| anyhow!("HOST '{}' resolved to no addresses", self.host))
    }
}

fn brand_from<G>(get: &G) -> Result<BrandVoice>
where
    G: Fn(&str) -> Option<String>,
{
    let defaults = BrandVoice::default();

    let hashtags = match get("BRAND_HASHTAGS") {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| {
                if t.starts_with('#') {
                    t.to_string()
                } else {
                    format!("#{}", t)
                }
            })
            .collect(),
        None => defaults.hashtags,
    };

    let max_hashtags = match get("BRAND_MAX_HASHTAGS") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|e| anyhow!("BRAND_MAX_HASHTAGS must be a number, got '{}': {}", raw, e))?,
        None => defaults.max_hashtags,
    };

    Ok(BrandVoice {
        name: get("BRAND_NAME").unwrap_or(defaults.name),
        voice: get("BRAND_VOICE").unwrap_or(defaults.voice),
        hashtags,
        max_hashtags,
        call_to_action: get("BRAND_CTA").unwrap_or(defaults.call_to_action),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[("TWITTER_CLIENT_ID", "cid"), ("GROQ_API_KEY", "gsk")];

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(REQUIRED)).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.oauth.redirect_uri, "http://localhost:3000/callback");
        assert_eq!(config.oauth.token_url, "https://api.twitter.com/2/oauth2/token");
        assert_eq!(config.oauth.client_secret, None);
        assert_eq!(config.completion.model, "llama3-8b-8192");
        assert_eq!(config.completion.max_tokens, 64);
        assert_eq!(config.token_file, PathBuf::from("data/tokens.json"));
        assert!(matches!(config.prompt, PromptVariant::Basic));
        assert_eq!(config.listen_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_port_drives_callback_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "8080"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.oauth.redirect_uri, "http://localhost:8080/callback");
    }

    #[test]
    fn test_listen_addr_resolves_hostname() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("HOST", "localhost"));
        let addr = AppConfig::from_lookup(lookup(&pairs))
            .unwrap()
            .listen_addr()
            .unwrap();

        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_listen_addr_accepts_bare_ipv6() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("HOST", "::1"));
        pairs.push(("PORT", "8080"));
        let addr = AppConfig::from_lookup(lookup(&pairs))
            .unwrap()
            .listen_addr()
            .unwrap();

        assert_eq!(addr, "[::1]:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_missing_client_id_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("GROQ_API_KEY", "gsk")])).unwrap_err();
        assert!(err.to_string().contains("TWITTER_CLIENT_ID"));
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "not-a-port"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_branded_variant_parses_hashtags() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PROMPT_VARIANT", "Branded"));
        pairs.push(("BRAND_HASHTAGS", "rust, #oss ,"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();

        match config.prompt {
            PromptVariant::Branded(voice) => {
                assert_eq!(voice.hashtags, vec!["#rust".to_string(), "#oss".to_string()]);
            }
            PromptVariant::Basic => panic!("expected branded variant"),
        }
    }

    #[test]
    fn test_unknown_variant_is_an_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PROMPT_VARIANT", "fancy"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }
}
