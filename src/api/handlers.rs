use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::CurrentUser;
use crate::center::filter::{InboxQuery, Tab};
use crate::center::{InboxView, NotificationCenter};
use crate::errors::AppError;
use crate::models::announcement::Announcement;
use crate::models::notification::{Notification, NotificationType};
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct ReadAllParams {
    #[serde(default)]
    pub tab: Tab,
}

#[derive(Serialize)]
pub struct ReadAllResponse {
    pub marked: usize,
}

#[derive(Deserialize)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct CreateNotificationRequest {
    /// Omit to address every user.
    pub user_id: Option<Uuid>,
    pub r#type: NotificationType,
    pub message: String,
}

fn center_for(state: &AppState, user_id: Uuid) -> NotificationCenter {
    NotificationCenter::new(user_id, state.inbox.clone(), state.provider.clone())
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /api/v1/inbox: merged notifications and announcements for the caller
pub async fn get_inbox(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<InboxQuery>,
) -> Json<InboxView> {
    let mut center = center_for(&state, user_id);
    center.load().await;
    Json(center.view(&query))
}

/// POST /api/v1/notifications/:id/read: acknowledge one notification
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Json<serde_json::Value> {
    let mut center = center_for(&state, user_id);
    let success = center.mark_notification_read(id).await;
    Json(json!({ "success": success }))
}

/// POST /api/v1/announcements/:id/read: acknowledge one announcement
pub async fn mark_announcement_read(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Json<serde_json::Value> {
    let mut center = center_for(&state, user_id);
    let success = center.mark_announcement_read(id).await;
    Json(json!({ "success": success }))
}

/// POST /api/v1/inbox/read-all?tab=: acknowledge every unread item of the tab
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(params): Query<ReadAllParams>,
) -> Json<ReadAllResponse> {
    let mut center = center_for(&state, user_id);
    center.load().await;
    let marked = center.mark_all_read(params.tab).await;
    Json(ReadAllResponse { marked })
}

/// POST /api/v1/admin/announcements: publish an announcement to every user
pub async fn create_announcement(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    let announcement = state
        .inbox
        .create_announcement(payload.title.trim(), &payload.content)
        .await?;
    tracing::info!(announcement_id = %announcement.id, "announcement published");
    Ok((StatusCode::CREATED, Json(announcement)))
}

/// POST /api/v1/admin/notifications: send a system notification
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    let notification = state
        .provider
        .create_notification(payload.user_id, payload.r#type, &payload.message)
        .await?;
    tracing::info!(
        notification_id = %notification.id,
        kind = %notification.r#type,
        "notification created"
    );
    Ok((StatusCode::CREATED, Json(notification)))
}
