//! Comment creation, deletion and listing
//!
//! Creation shares the transactional-then-best-effort-notify shape with
//! rating submission: the comment row commits first, then the recipe's
//! author is notified on a detached task.

use crate::auth::AuthContext;
use crate::db::models::Comment;
use crate::db::Repository;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::notify::{dispatch, NotificationEvent, Notifier};
use crate::sanitize;
use crate::validate::CommentInput;
use std::sync::Arc;
use tracing::info;

/// Page size for a recipe's comment feed
pub const COMMENTS_PAGE_SIZE: u64 = 20;

#[derive(Clone)]
pub struct CommentService {
    repo: Repository,
    notifier: Arc<dyn Notifier>,
}

impl CommentService {
    pub fn new(repo: Repository, notifier: Arc<dyn Notifier>) -> Self {
        Self { repo, notifier }
    }

    /// Create a comment on a live recipe
    pub async fn create(&self, auth: &AuthContext, input: CommentInput) -> Result<Comment> {
        input.validate_fields()?;

        let recipe = self
            .repo
            .find_recipe_by_id(input.recipe_id)
            .await?
            .ok_or_else(|| AppError::field("recipe_id", "Recipe not found"))?;

        let body = sanitize::sanitize_comment_body(&input.body);
        if body.is_empty() {
            return Err(AppError::field("body", "The comment is required"));
        }

        let comment = self.repo.insert_comment(recipe.id, auth.user_id, &body).await?;

        info!(
            comment_id = comment.id,
            recipe_id = recipe.id,
            user_id = auth.user_id,
            recipe_author_id = recipe.user_id,
            "Comment created"
        );
        metrics::record_comment_created();

        // Notify the recipe's author unless they commented on their own
        // recipe. Runs after commit; failure never reaches the caller.
        if recipe.user_id != auth.user_id {
            let event =
                NotificationEvent::new_comment(&recipe, auth.user_id, &auth.user_name, comment.id);
            dispatch(self.notifier.clone(), recipe.user_id, event);
        }

        Ok(comment)
    }

    /// Delete a comment. Only its author may delete it.
    pub async fn delete(&self, auth: &AuthContext, comment_id: i64) -> Result<()> {
        let comment = self
            .repo
            .find_comment_by_id(comment_id)
            .await?
            .ok_or(AppError::CommentNotFound { id: comment_id })?;

        if comment.user_id != auth.user_id {
            return Err(AppError::Forbidden {
                message: "Only the author may delete this comment".to_string(),
            });
        }

        let recipe_id = comment.recipe_id;
        self.repo.delete_comment(comment).await?;

        info!(comment_id, recipe_id, user_id = auth.user_id, "Comment deleted");

        Ok(())
    }

    /// List a live recipe's comments newest-first
    pub async fn list(&self, recipe_id: i64, page: u64) -> Result<(Vec<Comment>, u64)> {
        self.repo
            .find_recipe_by_id(recipe_id)
            .await?
            .ok_or(AppError::RecipeNotFound { id: recipe_id })?;

        self.repo
            .list_comments(recipe_id, page.max(1), COMMENTS_PAGE_SIZE)
            .await
    }
}
