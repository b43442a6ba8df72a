//! Notification inbox reads and read-state updates

use crate::auth::AuthContext;
use crate::db::models::Notification;
use crate::db::Repository;
use crate::errors::{AppError, Result};

#[derive(Clone)]
pub struct NotificationService {
    repo: Repository,
}

impl NotificationService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// The acting user's notifications, unread first
    pub async fn inbox(&self, auth: &AuthContext) -> Result<Vec<Notification>> {
        self.repo.list_notifications(auth.user_id).await
    }

    /// Mark one of the acting user's notifications as read. A miss (wrong
    /// owner, already read, or no such row) is a not-found.
    pub async fn mark_read(&self, auth: &AuthContext, id: i64) -> Result<()> {
        if self.repo.mark_notification_read(id, auth.user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound {
                resource_type: "notification".to_string(),
                id: id.to_string(),
            })
        }
    }

    /// Mark every unread notification as read; returns how many changed
    pub async fn mark_all_read(&self, auth: &AuthContext) -> Result<u64> {
        self.repo.mark_all_notifications_read(auth.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: sea_orm::DatabaseConnection) -> NotificationService {
        NotificationService::new(Repository::new(DbPool {
            primary: std::sync::Arc::new(db),
            replica: None,
        }))
    }

    fn acting_user(user_id: i64) -> AuthContext {
        AuthContext {
            user_id,
            user_name: "alice".to_string(),
            request_id: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mark_read_miss_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        match service(db).mark_read(&acting_user(1), 42).await {
            Err(AppError::NotFound { resource_type, id }) => {
                assert_eq!(resource_type, "notification");
                assert_eq!(id, "42");
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mark_read_hit_succeeds() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        assert!(service(db).mark_read(&acting_user(1), 42).await.is_ok());
    }
}
