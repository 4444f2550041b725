use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use crate::notification::EmailMessage;
use crate::AppState;

/// POST /api/send-gear-email: forward `{to, subject, html}` to the mail sender.
///
/// Other methods are answered with 405 by the router. A body that is not a
/// JSON object is treated as one with every field absent.
pub async fn send_gear_email(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<EmailMessage>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let message = payload.map(|Json(m)| m).unwrap_or_default();

    match state.mailer.send(&message).await {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({ "success": true, "result": result })),
        ),
        Err(e) => {
            tracing::error!(to = ?message.to, "send-gear-email failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": format!("{:#}", e) })),
            )
        }
    }
}
