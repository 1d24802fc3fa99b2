use agora_core::{ForumError, StatusClass};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Forum(#[from] ForumError),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Forum(e) => match e.status_class() {
                StatusClass::BadRequest => StatusCode::BAD_REQUEST,
                StatusClass::Unauthorized => StatusCode::UNAUTHORIZED,
                StatusClass::NotFound => StatusCode::NOT_FOUND,
                StatusClass::Conflict => StatusCode::CONFLICT,
                StatusClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{}", self);
        }

        let body = match &self {
            ApiError::Forum(ForumError::Validation(fields)) => serde_json::json!({
                "error": "Invalid input",
                "fields": fields,
            }),
            ApiError::Forum(e) => serde_json::json!({ "error": e.message() }),
            ApiError::Join(_) => serde_json::json!({ "error": "Internal server error" }),
        };

        (status, Json(body)).into_response()
    }
}

/// Run a synchronous core call off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ForumError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}
