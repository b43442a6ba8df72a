//! Rating submission
//!
//! Owns the aggregation pipeline: upsert by natural key and aggregate
//! recompute commit atomically in the repository; the notification for a
//! first-time rating is dispatched after commit, best-effort.

use crate::auth::AuthContext;
use crate::db::{RatingOutcome, Repository};
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::notify::{dispatch, NotificationEvent, Notifier};
use crate::sanitize;
use crate::validate::RatingInput;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct RatingService {
    repo: Repository,
    notifier: Arc<dyn Notifier>,
}

impl RatingService {
    pub fn new(repo: Repository, notifier: Arc<dyn Notifier>) -> Self {
        Self { repo, notifier }
    }

    /// Record a rating for a live recipe. A repeated rating from the same
    /// user overwrites the score of the existing row; the recipe's
    /// aggregate always reflects the committed row set.
    pub async fn rate(&self, auth: &AuthContext, input: RatingInput) -> Result<RatingOutcome> {
        input.validate_fields()?;

        let recipe = self
            .repo
            .find_recipe_by_id(input.recipe_id)
            .await?
            .ok_or_else(|| AppError::field("recipe_id", "Recipe not found"))?;

        let score = sanitize::sanitize_score(input.score);

        let outcome = self.repo.rate_recipe(recipe.id, auth.user_id, score).await?;

        info!(
            rating_id = outcome.rating.id,
            recipe_id = recipe.id,
            user_id = auth.user_id,
            score,
            was_created = outcome.newly_created,
            rating_avg = outcome.aggregate.average,
            rating_count = outcome.aggregate.count,
            "Rating recorded"
        );
        metrics::record_rating(score, outcome.newly_created);

        // Only first-time ratings notify, and never the author rating
        // their own recipe.
        if outcome.newly_created && auth.user_id != recipe.user_id {
            let event = NotificationEvent::new_rating(
                &recipe,
                auth.user_id,
                &auth.user_name,
                outcome.rating.id,
                score,
            );
            dispatch(self.notifier.clone(), recipe.user_id, event);
        }

        Ok(outcome)
    }
}
