//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations with proper
//! error handling and explicit transaction boundaries. The rating upsert
//! and aggregate recompute share one transaction; no partial aggregate
//! update is ever observable.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::validate::{RecipeDraft, SortBy, SortOrder};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, RuntimeErr, Set, SqlErr,
    Statement, TransactionTrait,
};

/// Aggregate rating statistics for one recipe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    /// Mean score rounded to 2 decimal places; 0 when no ratings exist
    pub average: f64,
    /// Number of rating rows
    pub count: i64,
}

impl RatingAggregate {
    /// Build from a raw `AVG(score)` / `COUNT(*)` pair. The average is
    /// rounded half away from zero to 2 decimal places.
    pub fn from_parts(avg_score: Option<f64>, total_ratings: i64) -> Self {
        if total_ratings > 0 {
            Self {
                average: round2(avg_score.unwrap_or(0.0)),
                count: total_ratings,
            }
        } else {
            Self {
                average: 0.0,
                count: 0,
            }
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Result of a rating submission
#[derive(Debug, Clone)]
pub struct RatingOutcome {
    pub rating: Rating,
    /// True when the submission inserted a new row rather than updating
    /// an existing one; gates the notification downstream
    pub newly_created: bool,
    pub aggregate: RatingAggregate,
}

/// One page of recipes plus the total match count
#[derive(Debug, Clone)]
pub struct RecipePage {
    pub recipes: Vec<Recipe>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Listing parameters resolved by the recipe service
#[derive(Debug, Clone)]
pub struct RecipeListParams {
    pub search: Option<String>,
    /// Restrict to one author (dashboard listing)
    pub author_id: Option<i64>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    /// 1-based page number
    pub page: u64,
    pub per_page: u64,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Recipe Operations
    // ========================================================================

    /// Find a live (non-deleted) recipe by ID
    pub async fn find_recipe_by_id(&self, id: i64) -> Result<Option<Recipe>> {
        RecipeEntity::find_by_id(id)
            .filter(RecipeColumn::DeletedAt.is_null())
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find a live recipe by slug. Slugs are not unique; the oldest match
    /// wins.
    pub async fn find_recipe_by_slug(&self, slug: &str) -> Result<Option<Recipe>> {
        RecipeEntity::find()
            .filter(RecipeColumn::Slug.eq(slug))
            .filter(RecipeColumn::DeletedAt.is_null())
            .order_by_asc(RecipeColumn::Id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Case-insensitive title existence check among non-deleted recipes,
    /// optionally excluding one recipe (the one being updated)
    pub async fn title_exists(&self, title: &str, exclude_id: Option<i64>) -> Result<bool> {
        let mut query = RecipeEntity::find()
            .filter(RecipeColumn::DeletedAt.is_null())
            .filter(
                Expr::expr(Func::lower(Expr::col(RecipeColumn::Title)))
                    .eq(title.to_lowercase()),
            );

        if let Some(id) = exclude_id {
            query = query.filter(RecipeColumn::Id.ne(id));
        }

        let count = query.count(self.read_conn()).await?;
        Ok(count > 0)
    }

    /// Insert a new recipe with a zeroed rating aggregate. A title race
    /// that slips past the service's pre-write check lands on the partial
    /// unique index and surfaces as [`AppError::DuplicateTitle`].
    pub async fn insert_recipe(&self, author_id: i64, draft: &RecipeDraft) -> Result<Recipe> {
        let now = chrono::Utc::now();

        let recipe = RecipeActiveModel {
            user_id: Set(author_id),
            title: Set(draft.title.clone()),
            slug: Set(draft.slug.clone()),
            description: Set(draft.description.clone()),
            ingredients: Set(serde_json::to_value(&draft.ingredients)?),
            steps: Set(serde_json::to_value(&draft.steps)?),
            rating_avg: Set(0.0),
            rating_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
            ..Default::default()
        };

        recipe
            .insert(self.write_conn())
            .await
            .map_err(|err| duplicate_title_or(err, &draft.title))
    }

    /// Update a recipe's content fields. The author and the rating
    /// aggregate are never touched here.
    pub async fn update_recipe(&self, recipe: Recipe, draft: &RecipeDraft) -> Result<Recipe> {
        let mut model = recipe.into_active_model();
        model.title = Set(draft.title.clone());
        model.slug = Set(draft.slug.clone());
        model.description = Set(draft.description.clone());
        model.ingredients = Set(serde_json::to_value(&draft.ingredients)?);
        model.steps = Set(serde_json::to_value(&draft.steps)?);
        model.updated_at = Set(chrono::Utc::now().into());

        model
            .update(self.write_conn())
            .await
            .map_err(|err| duplicate_title_or(err, &draft.title))
    }

    /// Soft-delete a recipe. Comment and rating rows are retained.
    pub async fn soft_delete_recipe(&self, recipe: Recipe) -> Result<()> {
        let mut model = recipe.into_active_model();
        model.deleted_at = Set(Some(chrono::Utc::now().into()));
        model.update(self.write_conn()).await?;
        Ok(())
    }

    /// List live recipes with search, sorting and pagination
    pub async fn list_recipes(&self, params: &RecipeListParams) -> Result<RecipePage> {
        let mut query = RecipeEntity::find().filter(RecipeColumn::DeletedAt.is_null());

        if let Some(author_id) = params.author_id {
            query = query.filter(RecipeColumn::UserId.eq(author_id));
        }

        if let Some(ref search) = params.search {
            // Titles are stored lower-cased, so a lower-cased pattern gives
            // a case-insensitive match.
            query = query.filter(RecipeColumn::Title.contains(&search.to_lowercase()));
        }

        let column = match params.sort_by {
            SortBy::CreatedAt => RecipeColumn::CreatedAt,
            SortBy::Title => RecipeColumn::Title,
            SortBy::RatingAvg => RecipeColumn::RatingAvg,
        };
        query = match params.sort_order {
            SortOrder::Asc => query.order_by_asc(column),
            SortOrder::Desc => query.order_by_desc(column),
        };

        let paginator = query.paginate(self.read_conn(), params.per_page);
        let total = paginator.num_items().await?;
        let recipes = paginator.fetch_page(params.page.saturating_sub(1)).await?;

        Ok(RecipePage {
            recipes,
            total,
            page: params.page,
            per_page: params.per_page,
        })
    }

    // ========================================================================
    // Comment Operations
    // ========================================================================

    /// Insert a comment inside its own transaction
    pub async fn insert_comment(&self, recipe_id: i64, user_id: i64, body: &str) -> Result<Comment> {
        let txn = self.write_conn().begin().await?;

        let comment = CommentActiveModel {
            recipe_id: Set(recipe_id),
            user_id: Set(user_id),
            body: Set(body.to_string()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };
        let comment = comment.insert(&txn).await?;

        txn.commit().await?;
        Ok(comment)
    }

    /// Find a comment by ID
    pub async fn find_comment_by_id(&self, id: i64) -> Result<Option<Comment>> {
        CommentEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete a comment row
    pub async fn delete_comment(&self, comment: Comment) -> Result<()> {
        CommentEntity::delete_by_id(comment.id)
            .exec(self.write_conn())
            .await?;
        Ok(())
    }

    /// List a recipe's comments newest-first
    pub async fn list_comments(
        &self,
        recipe_id: i64,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Comment>, u64)> {
        let paginator = CommentEntity::find()
            .filter(CommentColumn::RecipeId.eq(recipe_id))
            .order_by_desc(CommentColumn::CreatedAt)
            .paginate(self.read_conn(), per_page);

        let total = paginator.num_items().await?;
        let comments = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((comments, total))
    }

    // ========================================================================
    // Rating Operations
    // ========================================================================

    /// Record a rating: upsert by `(recipe_id, user_id)` and recompute the
    /// recipe's aggregate, all inside one transaction.
    ///
    /// The upsert is select-then-insert, so two concurrent first-time
    /// ratings by the same user can race on the unique constraint; the
    /// losing transaction rolls back and is retried once, taking the update
    /// path on the second pass.
    pub async fn rate_recipe(&self, recipe_id: i64, user_id: i64, score: i16) -> Result<RatingOutcome> {
        match self.try_rate(recipe_id, user_id, score).await {
            Err(AppError::Database(ref db_err)) if is_unique_violation(db_err) => {
                tracing::debug!(
                    recipe_id,
                    user_id,
                    "Rating upsert lost a uniqueness race; retrying once"
                );
                self.try_rate(recipe_id, user_id, score).await
            }
            other => other,
        }
    }

    async fn try_rate(&self, recipe_id: i64, user_id: i64, score: i16) -> Result<RatingOutcome> {
        let txn = self.write_conn().begin().await?;

        // Upsert keyed by the natural key
        let existing = RatingEntity::find()
            .filter(RatingColumn::RecipeId.eq(recipe_id))
            .filter(RatingColumn::UserId.eq(user_id))
            .one(&txn)
            .await?;

        let (rating, newly_created) = match existing {
            Some(row) => {
                let mut model = row.into_active_model();
                model.score = Set(score);
                (model.update(&txn).await?, false)
            }
            None => {
                let model = RatingActiveModel {
                    recipe_id: Set(recipe_id),
                    user_id: Set(user_id),
                    score: Set(score),
                    created_at: Set(chrono::Utc::now().into()),
                    ..Default::default()
                };
                (model.insert(&txn).await?, true)
            }
        };

        // Recompute from the authoritative row set within the same
        // transaction; incremental adjustment would drift.
        let aggregate = Self::aggregate_for(&txn, recipe_id).await?;
        Self::write_aggregate(&txn, recipe_id, aggregate).await?;

        txn.commit().await?;

        Ok(RatingOutcome {
            rating,
            newly_created,
            aggregate,
        })
    }

    async fn aggregate_for<C: ConnectionTrait>(conn: &C, recipe_id: i64) -> Result<RatingAggregate> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            SELECT CAST(AVG(score) AS DOUBLE PRECISION) AS avg_score,
                   COUNT(*) AS total_ratings
            FROM ratings
            WHERE recipe_id = $1
            "#,
            [recipe_id.into()],
        );

        let row = conn.query_one(stmt).await?.ok_or_else(|| AppError::Internal {
            message: format!("Aggregate query returned no row for recipe {}", recipe_id),
        })?;

        let avg_score: Option<f64> = row.try_get("", "avg_score").map_err(AppError::from)?;
        let total_ratings: i64 = row.try_get("", "total_ratings").map_err(AppError::from)?;

        Ok(RatingAggregate::from_parts(avg_score, total_ratings))
    }

    async fn write_aggregate<C: ConnectionTrait>(
        conn: &C,
        recipe_id: i64,
        aggregate: RatingAggregate,
    ) -> Result<()> {
        RecipeEntity::update_many()
            .col_expr(RecipeColumn::RatingAvg, Expr::value(aggregate.average))
            .col_expr(RecipeColumn::RatingCount, Expr::value(aggregate.count as i32))
            .filter(RecipeColumn::Id.eq(recipe_id))
            .exec(conn)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Notification Operations
    // ========================================================================

    /// Persist a delivered notification for its recipient
    pub async fn insert_notification(
        &self,
        recipient_id: i64,
        kind: &str,
        data: serde_json::Value,
    ) -> Result<Notification> {
        let notification = NotificationActiveModel {
            user_id: Set(recipient_id),
            kind: Set(kind.to_string()),
            data: Set(data),
            read_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        notification.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// List a user's notifications, unread first, newest first within each
    /// group
    pub async fn list_notifications(&self, user_id: i64) -> Result<Vec<Notification>> {
        NotificationEntity::find()
            .filter(NotificationColumn::UserId.eq(user_id))
            .order_by_asc(NotificationColumn::ReadAt)
            .order_by_desc(NotificationColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Mark one notification read; returns false when the row does not
    /// belong to the user or does not exist
    pub async fn mark_notification_read(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = NotificationEntity::update_many()
            .col_expr(
                NotificationColumn::ReadAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(NotificationColumn::Id.eq(id))
            .filter(NotificationColumn::UserId.eq(user_id))
            .filter(NotificationColumn::ReadAt.is_null())
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Mark all of a user's notifications read; returns how many changed
    pub async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64> {
        let result = NotificationEntity::update_many()
            .col_expr(
                NotificationColumn::ReadAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(NotificationColumn::UserId.eq(user_id))
            .filter(NotificationColumn::ReadAt.is_null())
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected)
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }

    // sql_err only classifies errors it can downcast to a concrete backend
    // type; fall back to sqlx's own classification otherwise.
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => e.is_unique_violation(),
        _ => false,
    }
}

/// Map a unique-index violation on the recipes title index to the
/// conflict error; pass everything else through.
fn duplicate_title_or(err: DbErr, title: &str) -> AppError {
    if is_unique_violation(&err) {
        AppError::DuplicateTitle {
            title: title.to_string(),
        }
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn mock_repo(db: DatabaseConnection) -> Repository {
        Repository::new(DbPool {
            primary: std::sync::Arc::new(db),
            replica: None,
        })
    }

    fn rating_row(id: i64, recipe_id: i64, user_id: i64, score: i16) -> Rating {
        Rating {
            id,
            recipe_id,
            user_id,
            score,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn aggregate_row(avg: Option<f64>, total: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("avg_score", Value::Double(avg)),
            ("total_ratings", Value::BigInt(Some(total))),
        ])
    }

    fn unique_violation_err() -> DbErr {
        #[derive(Debug)]
        struct DuplicateKey;

        impl std::fmt::Display for DuplicateKey {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("duplicate key value violates unique constraint")
            }
        }

        impl std::error::Error for DuplicateKey {}

        impl sqlx::error::DatabaseError for DuplicateKey {
            fn message(&self) -> &str {
                "duplicate key value violates unique constraint"
            }

            fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
                Some("23505".into())
            }

            fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
                self
            }

            fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
                self
            }

            fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
                self
            }

            fn kind(&self) -> sqlx::error::ErrorKind {
                sqlx::error::ErrorKind::UniqueViolation
            }
        }

        DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(Box::new(
            DuplicateKey,
        ))))
    }

    #[test]
    fn test_unique_violation_classification() {
        assert!(is_unique_violation(&unique_violation_err()));
        assert!(!is_unique_violation(&DbErr::Custom("boom".to_string())));
    }

    #[tokio::test]
    async fn test_first_rating_takes_insert_path() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // No existing row for this (recipe, user) pair
            .append_query_results([Vec::<Rating>::new()])
            // INSERT .. RETURNING
            .append_query_results([vec![rating_row(9, 1, 2, 4)]])
            // Aggregate recompute
            .append_query_results([vec![aggregate_row(Some(4.0), 1)]])
            // Aggregate write-back
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let outcome = mock_repo(db).rate_recipe(1, 2, 4).await.unwrap();

        assert!(outcome.newly_created);
        assert_eq!(outcome.rating.score, 4);
        assert_eq!(outcome.aggregate.average, 4.0);
        assert_eq!(outcome.aggregate.count, 1);
    }

    #[tokio::test]
    async fn test_repeat_rating_updates_existing_row() {
        // User 2 re-rates recipe 1 from 2 to 5 stars.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![rating_row(9, 1, 2, 2)]])
            // UPDATE .. RETURNING
            .append_query_results([vec![rating_row(9, 1, 2, 5)]])
            .append_query_results([vec![aggregate_row(Some(5.0), 1)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let outcome = mock_repo(db).rate_recipe(1, 2, 5).await.unwrap();

        assert!(!outcome.newly_created);
        assert_eq!(outcome.rating.id, 9);
        assert_eq!(outcome.rating.score, 5);
        // The row was revised, not added; the count is unchanged.
        assert_eq!(outcome.aggregate.count, 1);
        assert_eq!(outcome.aggregate.average, 5.0);
    }

    #[tokio::test]
    async fn test_rating_retries_once_on_lost_uniqueness_race() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // First pass: no row visible yet, then the insert hits the
            // unique constraint because a concurrent submission won.
            .append_query_results([Vec::<Rating>::new()])
            .append_query_errors([unique_violation_err()])
            // Second pass: the winner's row is visible; update path.
            .append_query_results([vec![rating_row(9, 1, 2, 3)]])
            .append_query_results([vec![rating_row(9, 1, 2, 4)]])
            .append_query_results([vec![aggregate_row(Some(4.0), 1)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let outcome = mock_repo(db).rate_recipe(1, 2, 4).await.unwrap();

        // The retry lands on the update path; exactly one row exists.
        assert!(!outcome.newly_created);
        assert_eq!(outcome.rating.score, 4);
        assert_eq!(outcome.aggregate.count, 1);
    }

    #[tokio::test]
    async fn test_rating_does_not_retry_other_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Rating>::new()])
            .append_query_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();

        match mock_repo(db).rate_recipe(1, 2, 4).await {
            Err(AppError::Database(_)) => {}
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insert_recipe_title_race_maps_to_duplicate_title() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([unique_violation_err()])
            .into_connection();

        let draft = RecipeDraft {
            title: "chocolate cake".to_string(),
            slug: "chocolate-cake".to_string(),
            description: None,
            ingredients: vec!["Flour".to_string()],
            steps: vec!["Step 1: Mix".to_string()],
        };

        match mock_repo(db).insert_recipe(1, &draft).await {
            Err(AppError::DuplicateTitle { title }) => assert_eq!(title, "chocolate cake"),
            other => panic!("expected duplicate title, got {other:?}"),
        }
    }

    #[test]
    fn test_aggregate_rounds_to_two_places() {
        let agg = RatingAggregate::from_parts(Some(4.0), 3);
        assert_eq!(agg.average, 4.0);
        assert_eq!(agg.count, 3);

        // [1, 1, 2] -> 1.333... -> 1.33
        let agg = RatingAggregate::from_parts(Some(4.0 / 3.0), 3);
        assert_eq!(agg.average, 1.33);

        // [2, 5] -> 3.5
        let agg = RatingAggregate::from_parts(Some(3.5), 2);
        assert_eq!(agg.average, 3.5);

        // [4, 4, 5] -> 4.333... -> 4.33
        let agg = RatingAggregate::from_parts(Some(13.0 / 3.0), 3);
        assert_eq!(agg.average, 4.33);
    }

    #[test]
    fn test_aggregate_empty_resets_to_zero() {
        let agg = RatingAggregate::from_parts(None, 0);
        assert_eq!(agg.average, 0.0);
        assert_eq!(agg.count, 0);
    }

    #[test]
    fn test_aggregate_ignores_avg_when_count_zero() {
        // A stale average must not survive a count of zero.
        let agg = RatingAggregate::from_parts(Some(4.2), 0);
        assert_eq!(agg.average, 0.0);
        assert_eq!(agg.count, 0);
    }

    #[test]
    fn test_round2_truncates_repeating_fractions() {
        assert_eq!(round2(11.0 / 3.0), 3.67);
        assert_eq!(round2(8.0 / 3.0), 2.67);
        assert_eq!(round2(3.0), 3.0);
    }
}
