use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::report::ReportError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing or invalid user")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    ReportFailed(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::MissingRange => AppError::Validation(err.to_string()),
            ReportError::Failed => AppError::ReportFailed(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "user_required",
                "missing or invalid x-user-id header".to_string(),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "validation_failed",
                msg.clone(),
            ),
            AppError::ReportFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "report_error",
                "report_failed",
                msg.clone(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_errors_map_to_status() {
        let missing = AppError::from(ReportError::MissingRange).into_response();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let failed = AppError::from(ReportError::Failed).into_response();
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_errors_become_internal() {
        let err: AppError = anyhow::anyhow!("connection refused").into();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
