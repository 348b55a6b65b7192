use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("No article found for {0}")]
    NotFound(String),

    #[error("No article has been generated yet; try again later")]
    NotGenerated,

    #[error("Internal error: {0}")]
    Internal(#[from] ServiceError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::NotConfigured(_) | WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::NotGenerated => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}
