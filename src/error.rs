use crate::github::client::UpstreamError;
use crate::storage::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}

impl AppError {
    /// Message shown to clients. Internals stay in the logs.
    fn public_message(&self) -> &'static str {
        match self {
            AppError::Store(_) => "Failed to process visitor data",
            AppError::Upstream(_) => "Failed to fetch GitHub data",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Store(e) => tracing::error!(error = %e, "store error"),
            AppError::Upstream(e) => tracing::error!(error = %e, "upstream error"),
        }

        let body = json!({ "error": self.public_message() });
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_error_maps_to_generic_500() {
        let err = AppError::from(StoreError::Interact("worker panicked".to_string()));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Failed to process visitor data");
        assert!(!body.to_string().contains("panicked"));
    }
}
