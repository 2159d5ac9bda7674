//! ============================================================================
//! Routes - HTTP surface over PromoFlow
//! ============================================================================
//! Flow errors become a 400 plain-text body or a generic 500 (see errors.rs).
//! ============================================================================

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tweetsmith_core::{CallbackParams, PromoFlow};

use crate::errors::{ServerResult, WithGeneric};

const HOME_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Tweetsmith</title>
</head>
<body>
    <h1>Tweetsmith</h1>
    <p>A local application for posting AI-generated tweets</p>
    <ul>
        <li><a href="/auth">Authenticate with Twitter</a></li>
        <li><a href="/tweet">Generate and Post a Tweet</a></li>
    </ul>
</body>
</html>
"#;

pub fn routes(flow: Arc<PromoFlow>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/auth", get(auth))
        .route("/callback", get(callback))
        .route("/tweet", get(tweet))
        .layer(TraceLayer::new_for_http())
        .with_state(flow)
}

async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

async fn health() -> &'static str {
    "ok"
}

async fn auth(State(flow): State<Arc<PromoFlow>>) -> ServerResult<Response> {
    let url = flow
        .start_authorization()
        .await
        .with_generic("Authentication error")?;

    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

async fn callback(
    State(flow): State<Arc<PromoFlow>>,
    Query(params): Query<CallbackParams>,
) -> ServerResult<Json<serde_json::Value>> {
    let profile = flow
        .complete_authorization(params)
        .await
        .with_generic("Callback processing error")?;

    Ok(Json(profile))
}

async fn tweet(State(flow): State<Arc<PromoFlow>>) -> ServerResult<Json<serde_json::Value>> {
    let post = flow.post_promo().await.with_generic("Error posting tweet")?;

    Ok(Json(post))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::collections::HashMap;
    use tower::ServiceExt;
    use tweetsmith_core::config::{CompletionConfig, OAuthConfig, TWITTER_SCOPES};
    use tweetsmith_core::{
        AppConfig, MemoryTokenStore, PromptVariant, SessionState, SessionStore,
    };
    use wiremock::matchers::{body_partial_json, body_string_contains, header as header_is, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        app: Router,
        store: Arc<MemoryTokenStore>,
        server: MockServer,
    }

    impl Harness {
        async fn new(session: SessionState) -> Self {
            let server = MockServer::start().await;
            let config = AppConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                token_file: "unused.json".into(),
                api_base: server.uri(),
                oauth: OAuthConfig {
                    client_id: "cid".to_string(),
                    client_secret: None,
                    redirect_uri: "http://localhost:3000/callback".to_string(),
                    authorize_url: "https://twitter.com/i/oauth2/authorize".to_string(),
                    token_url: format!("{}/2/oauth2/token", server.uri()),
                    scopes: TWITTER_SCOPES.iter().map(|s| s.to_string()).collect(),
                },
                completion: CompletionConfig {
                    api_url: format!("{}/openai/v1/chat/completions", server.uri()),
                    api_key: "gsk".to_string(),
                    model: "llama3-8b-8192".to_string(),
                    max_tokens: 64,
                },
                prompt: PromptVariant::Basic,
            };

            let store = Arc::new(MemoryTokenStore::with_session(session));
            let flow = PromoFlow::new(&config, SessionStore::from_arc(store.clone()));

            Self {
                app: routes(Arc::new(flow)),
                store,
                server,
            }
        }

        async fn get(&self, uri: &str) -> (StatusCode, Response) {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = self.app.clone().oneshot(request).await.unwrap();
            (response.status(), response)
        }

        async fn mock_token(&self, grant: &str, access: &str, refresh: &str, times: u64) {
            Mock::given(method("POST"))
                .and(path("/2/oauth2/token"))
                .and(body_string_contains(format!("grant_type={}", grant)))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "token_type": "bearer",
                    "access_token": access,
                    "refresh_token": refresh,
                    "expires_in": 7200
                })))
                .expect(times)
                .mount(&self.server)
                .await;
        }

        async fn mock_completion(&self, text: &str, times: u64) {
            Mock::given(method("POST"))
                .and(path("/openai/v1/chat/completions"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }]
                })))
                .expect(times)
                .mount(&self.server)
                .await;
        }

        async fn mock_post(&self, text: &str, id: &str, times: u64) {
            Mock::given(method("POST"))
                .and(path("/2/tweets"))
                .and(body_partial_json(serde_json::json!({ "text": text })))
                .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                    "data": { "id": id, "text": text }
                })))
                .expect(times)
                .mount(&self.server)
                .await;
        }
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    fn location(response: &Response) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    fn query_param(url: &str, key: &str) -> String {
        let (_, query) = url.split_once('?').unwrap();
        let params: HashMap<&str, &str> = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .collect();
        params[key].to_string()
    }

    #[tokio::test]
    async fn test_home_page_links() {
        let harness = Harness::new(SessionState::default()).await;
        let (status, response) = harness.get("/").await;

        assert_eq!(status, StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains(r#"href="/auth""#));
        assert!(body.contains(r#"href="/tweet""#));
    }

    #[tokio::test]
    async fn test_auth_redirects_and_persists_pending_pair() {
        let harness = Harness::new(SessionState::default()).await;
        let (status, response) = harness.get("/auth").await;

        assert_eq!(status, StatusCode::FOUND);
        let url = location(&response);
        let session = harness.store.snapshot();

        assert!(url.starts_with("https://twitter.com/i/oauth2/authorize"));
        assert_eq!(session.state.as_deref(), Some(query_param(&url, "state").as_str()));
        assert!(session.code_verifier.is_some());
        assert!(session.access_token.is_none());
    }

    #[tokio::test]
    async fn test_second_auth_invalidates_first_state() {
        let harness = Harness::new(SessionState::default()).await;
        harness.mock_token("authorization_code", "a", "r", 0).await;

        let (_, first) = harness.get("/auth").await;
        let first_state = query_param(&location(&first), "state");
        let (_, second) = harness.get("/auth").await;
        let second_state = query_param(&location(&second), "state");
        assert_ne!(first_state, second_state);

        let (status, response) = harness
            .get(&format!("/callback?state={}&code=C", first_state))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Stored tokens do not match!");
        assert_eq!(harness.store.snapshot().state.as_deref(), Some(second_state.as_str()));
    }

    #[tokio::test]
    async fn test_mismatched_state_never_exchanges() {
        let harness = Harness::new(SessionState::pending("V", "S")).await;
        harness.mock_token("authorization_code", "a", "r", 0).await;

        for uri in ["/callback?state=s&code=C", "/callback?state=S2&code=C", "/callback?code=C"] {
            let (status, _) = harness.get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        }

        assert_eq!(harness.store.snapshot(), SessionState::pending("V", "S"));
    }

    #[tokio::test]
    async fn test_tweet_without_authorization_is_client_error() {
        let harness = Harness::new(SessionState::default()).await;
        harness.mock_token("refresh_token", "a", "r", 0).await;
        harness.mock_completion("never", 0).await;
        harness.mock_post("never", "0", 0).await;

        let (status, response) = harness.get("/tweet").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            "No refresh token found. Please authenticate first."
        );
    }

    #[tokio::test]
    async fn test_exchange_failure_is_generic_500() {
        let harness = Harness::new(SessionState::pending("V", "S")).await;
        Mock::given(method("POST"))
            .and(path("/2/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .expect(1)
            .mount(&harness.server)
            .await;

        let (status, response) = harness.get("/callback?state=S&code=C").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "Callback processing error");
    }

    #[tokio::test]
    async fn test_publish_failure_is_generic_500() {
        let harness = Harness::new(SessionState::authorized("A0", Some("R0".to_string()))).await;
        harness.mock_token("refresh_token", "A1", "R1", 1).await;
        harness.mock_completion("hello", 1).await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(403).set_body_string("duplicate"))
            .expect(1)
            .mount(&harness.server)
            .await;

        let (status, response) = harness.get("/tweet").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "Error posting tweet");
        // The rotated pair is kept even though publishing failed
        assert_eq!(harness.store.snapshot().refresh_token.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn test_overlong_text_is_posted_unmodified() {
        let long = "z".repeat(350);
        let harness = Harness::new(SessionState::authorized("A0", Some("R0".to_string()))).await;
        harness.mock_token("refresh_token", "A1", "R1", 1).await;
        harness.mock_completion(&long, 1).await;
        harness.mock_post(&long, "123", 1).await;

        let (status, response) = harness.get("/tweet").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(response).await["text"], long);
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let harness = Harness::new(SessionState::default()).await;

        // GET /auth
        let (status, response) = harness.get("/auth").await;
        assert_eq!(status, StatusCode::FOUND);
        let state = query_param(&location(&response), "state");
        let pending = harness.store.snapshot();
        assert_eq!(pending.state.as_deref(), Some(state.as_str()));
        // Form bodies percent-encode '~'; the rest of the PKCE charset is left as-is
        let verifier = pending.code_verifier.clone().unwrap().replace('~', "%7E");

        // GET /callback
        Mock::given(method("POST"))
            .and(path("/2/oauth2/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=C"))
            .and(body_string_contains(format!("code_verifier={}", verifier)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A1",
                "refresh_token": "R1"
            })))
            .expect(1)
            .mount(&harness.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/2/users/me"))
            .and(header_is("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "42", "name": "Ada", "username": "ada" }
            })))
            .expect(1)
            .mount(&harness.server)
            .await;

        let (status, response) = harness
            .get(&format!("/callback?state={}&code=C", state))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(response).await["username"], "ada");
        assert_eq!(
            harness.store.snapshot(),
            SessionState::authorized("A1", Some("R1".to_string()))
        );

        // GET /tweet
        harness.mock_token("refresh_token", "A2", "R2", 1).await;
        harness.mock_completion("Shipping Rust today #techtwitter", 1).await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(header_is("authorization", "Bearer A2"))
            .and(body_partial_json(serde_json::json!({ "text": "Shipping Rust today #techtwitter" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "data": { "id": "1790000000000000001", "text": "Shipping Rust today #techtwitter" }
            })))
            .expect(1)
            .mount(&harness.server)
            .await;

        let (status, response) = harness.get("/tweet").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(response).await["id"], "1790000000000000001");

        let session = harness.store.snapshot();
        assert_eq!(session.refresh_token.as_deref(), Some("R2"));
        assert_ne!(session.refresh_token.as_deref(), Some("R1"));
    }
}
