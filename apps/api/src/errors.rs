use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractError;
use crate::layout::LayoutError;
use crate::render::RenderError;

/// User-visible message for uploads we cannot read.
pub const UNSUPPORTED_FILE_MESSAGE: &str = "文件格式不支持或解析失败";
/// User-visible message when no word of the configured class was found.
pub const NOTHING_TO_RENDER_MESSAGE: &str = "未找到可生成词云的形容词";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    #[error("Nothing to render")]
    NothingToRender,

    #[error("Layout configuration error: {0}")]
    LayoutConfig(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LayoutError> for AppError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::EmptyInput => AppError::NothingToRender,
            other => AppError::LayoutConfig(other.to_string()),
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(msg) => AppError::UnsupportedFile(msg),
            ExtractError::Parse(msg) => AppError::UnreadableFile(msg),
            ExtractError::Io(e) => AppError::Internal(anyhow::Error::new(e).context("reading upload")),
        }
    }
}

impl AppError {
    /// Status, machine code and the message shown to the user.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedFile(msg) => {
                tracing::info!("Unsupported upload: {msg}");
                (
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "UNSUPPORTED_FORMAT",
                    UNSUPPORTED_FILE_MESSAGE.to_string(),
                )
            }
            AppError::UnreadableFile(msg) => {
                tracing::info!("Unreadable upload: {msg}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "PARSE_ERROR",
                    UNSUPPORTED_FILE_MESSAGE.to_string(),
                )
            }
            AppError::NothingToRender => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NOTHING_TO_RENDER",
                NOTHING_TO_RENDER_MESSAGE.to_string(),
            ),
            AppError::LayoutConfig(msg) => {
                tracing::error!("Layout configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LAYOUT_CONFIG_ERROR",
                    "The word cloud is misconfigured".to_string(),
                )
            }
            AppError::Render(e) => {
                tracing::error!("Render error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    "Failed to render the word cloud".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
