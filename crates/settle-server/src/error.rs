//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use settle_templates::TemplateError;
use settle_watch::WatchError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Template loading or rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// The file watcher failed; live reload cannot continue.
    #[error("Watch error: {0}")]
    Watch(#[from] WatchError),

    /// The listen address could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Template(TemplateError::NotFound(name)) => (
                StatusCode::NOT_FOUND,
                json!({"error": "Template not found", "name": name}),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": self.to_string()}),
            ),
        };

        tracing::warn!(status = %status, error = %self, "Request failed");
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_template_is_not_found() {
        let response =
            ServerError::from(TemplateError::NotFound("base.html".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_other_errors_are_internal_with_json_body() {
        let response = ServerError::Io(std::io::Error::other("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "I/O error: disk on fire");
    }
}
