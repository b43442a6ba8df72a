//! Notification inbox handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::AppState;
use tastebook_common::{auth::AuthContext, db::models::Notification, errors::Result};

#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
    pub read_at: Option<String>,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            data: notification.data,
            read_at: notification.read_at.map(|dt| dt.to_rfc3339()),
            created_at: notification.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub marked_read: u64,
}

/// List the authenticated user's notifications, unread first
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<NotificationListResponse>> {
    let notifications = state.notifications.inbox(&auth).await?;

    Ok(Json(NotificationListResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
    }))
}

/// Mark a single notification as read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.notifications.mark_read(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark every unread notification as read
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<MarkAllReadResponse>> {
    let marked_read = state.notifications.mark_all_read(&auth).await?;
    Ok(Json(MarkAllReadResponse { marked_read }))
}
