//! Best-effort notification dispatch
//!
//! Events are delivered after the triggering transaction commits. Delivery
//! is fire-and-forget: failures are logged and swallowed, and never undo or
//! fail the committed write.

use crate::db::{models::Recipe, DbPool, Repository};
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Notification event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewComment,
    NewRating,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewComment => "new_comment",
            NotificationKind::NewRating => "new_rating",
        }
    }
}

/// A fully-formed notification event handed to the notifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub recipe_id: i64,
    pub recipe_title: String,
    pub actor_id: i64,
    pub actor_name: String,
    pub payload: serde_json::Value,
}

impl NotificationEvent {
    /// Event for a new comment on a recipe
    pub fn new_comment(recipe: &Recipe, actor_id: i64, actor_name: &str, comment_id: i64) -> Self {
        Self {
            kind: NotificationKind::NewComment,
            recipe_id: recipe.id,
            recipe_title: recipe.title.clone(),
            actor_id,
            actor_name: actor_name.to_string(),
            payload: serde_json::json!({
                "comment_id": comment_id,
                "message": format!("{} commented on \"{}\"", actor_name, recipe.title),
            }),
        }
    }

    /// Event for a first-time rating on a recipe
    pub fn new_rating(recipe: &Recipe, actor_id: i64, actor_name: &str, rating_id: i64, score: i16) -> Self {
        Self {
            kind: NotificationKind::NewRating,
            recipe_id: recipe.id,
            recipe_title: recipe.title.clone(),
            actor_id,
            actor_name: actor_name.to_string(),
            payload: serde_json::json!({
                "rating_id": rating_id,
                "score": score,
                "message": format!("{} rated \"{}\" with {} star(s)", actor_name, recipe.title, score),
            }),
        }
    }
}

/// Delivery channel for notification events
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, recipient_id: i64, event: NotificationEvent) -> Result<()>;
}

/// Default notifier: persists events as rows in the notifications table,
/// read back through the recipient's inbox endpoints
pub struct DatabaseNotifier {
    repo: Repository,
}

impl DatabaseNotifier {
    pub fn new(pool: DbPool) -> Self {
        Self {
            repo: Repository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for DatabaseNotifier {
    async fn deliver(&self, recipient_id: i64, event: NotificationEvent) -> Result<()> {
        let kind = event.kind.as_str();
        let data = serde_json::to_value(&event).map_err(|e| AppError::Notification {
            message: format!("Failed to serialize event: {}", e),
        })?;

        self.repo
            .insert_notification(recipient_id, kind, data)
            .await
            .map_err(|e| AppError::Notification {
                message: e.to_string(),
            })?;

        debug!(recipient_id, kind, "Notification delivered");
        Ok(())
    }
}

/// Dispatch an event on a detached task. Runs after the triggering
/// transaction has committed; a delivery failure is logged and swallowed.
pub fn dispatch(notifier: Arc<dyn Notifier>, recipient_id: i64, event: NotificationEvent) {
    tokio::spawn(async move {
        let kind = event.kind.as_str();
        let recipe_id = event.recipe_id;

        if let Err(e) = notifier.deliver(recipient_id, event).await {
            warn!(
                error = %e,
                recipient_id,
                recipe_id,
                kind,
                "Notification delivery failed; the triggering write is unaffected"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::NewComment).unwrap(),
            r#""new_comment""#
        );
        assert_eq!(NotificationKind::NewRating.as_str(), "new_rating");
    }

    #[test]
    fn test_event_shape() {
        let recipe = Recipe {
            id: 3,
            user_id: 1,
            title: "chocolate cake".to_string(),
            slug: "chocolate-cake".to_string(),
            description: None,
            ingredients: serde_json::json!(["Flour"]),
            steps: serde_json::json!(["Step 1: Mix"]),
            rating_avg: 0.0,
            rating_count: 0,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
            deleted_at: None,
        };

        let event = NotificationEvent::new_rating(&recipe, 2, "alice", 9, 5);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "new_rating");
        assert_eq!(value["recipe_id"], 3);
        assert_eq!(value["actor_name"], "alice");
        assert_eq!(value["payload"]["score"], 5);
        assert_eq!(
            value["payload"]["message"],
            "alice rated \"chocolate cake\" with 5 star(s)"
        );
    }

    /// Delivery failures must never propagate out of dispatch.
    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        struct FailingNotifier;

        #[async_trait::async_trait]
        impl Notifier for FailingNotifier {
            async fn deliver(&self, _recipient_id: i64, _event: NotificationEvent) -> Result<()> {
                Err(AppError::Notification {
                    message: "channel down".to_string(),
                })
            }
        }

        let recipe = Recipe {
            id: 1,
            user_id: 1,
            title: "t".to_string(),
            slug: "t".to_string(),
            description: None,
            ingredients: serde_json::json!([]),
            steps: serde_json::json!([]),
            rating_avg: 0.0,
            rating_count: 0,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
            deleted_at: None,
        };

        let event = NotificationEvent::new_comment(&recipe, 2, "bob", 5);
        dispatch(Arc::new(FailingNotifier), 1, event);

        // Let the spawned task run to completion; nothing to assert beyond
        // the absence of a panic reaching the test.
        tokio::task::yield_now().await;
    }
}
