//! ============================================================================
//! Server Errors - Mapping FlowError to HTTP responses
//! ============================================================================
//! Client errors answer 400 with their message. Upstream failures are
//! logged and answer 500 with a route-specific generic message.
//! ============================================================================

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tweetsmith_core::FlowError;

/// A flow failure paired with the generic message shown for upstream errors
#[derive(Debug)]
pub struct ServerError {
    pub(crate) error: FlowError,
    pub(crate) generic: &'static str,
}

pub type ServerResult<T> = Result<T, ServerError>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.error.is_client_error() {
            tracing::warn!(error = %self.error, "Rejected request");
            (StatusCode::BAD_REQUEST, self.error.to_string()).into_response()
        } else {
            tracing::error!(error = ?self.error, "{}", self.generic);
            (StatusCode::INTERNAL_SERVER_ERROR, self.generic).into_response()
        }
    }
}

pub(crate) trait WithGeneric<T> {
    fn with_generic(self, generic: &'static str) -> ServerResult<T>;
}

impl<T> WithGeneric<T> for Result<T, FlowError> {
    fn with_generic(self, generic: &'static str) -> ServerResult<T> {
        self.map_err(|error| ServerError { error, generic })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_bad_request() {
        let response = Err::<(), _>(FlowError::NotAuthorized)
            .with_generic("Error posting tweet")
            .unwrap_err()
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_errors_are_generic_500() {
        let response = Err::<(), _>(FlowError::Upstream(anyhow::anyhow!("boom")))
            .with_generic("Error posting tweet")
            .unwrap_err()
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
