use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use vela_core::CoreError;

#[derive(Debug)]
pub enum ApiError {
    Core(CoreError),
    Anyhow(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Core(CoreError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Core(CoreError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg),
            ApiError::Core(err @ (CoreError::Gateway(_) | CoreError::GatewayTimeout(_))) => {
                tracing::error!("Upstream gateway error: {}", err);
                (StatusCode::BAD_GATEWAY, "Upstream gateway failure".to_string())
            }
            ApiError::Core(CoreError::Storage(msg)) => {
                // Storage internals stay in the logs.
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            ApiError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
