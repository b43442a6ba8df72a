//! Recipe creation, update, soft deletion and listing

use crate::auth::AuthContext;
use crate::db::models::Recipe;
use crate::db::{RecipeListParams, RecipePage, Repository};
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::validate::{RecipeDraft, RecipeInput, RecipeListQuery};
use tracing::info;

/// Page size for the public listing
pub const PUBLIC_PAGE_SIZE: u64 = 9;

/// Page size for the author dashboard
pub const DASHBOARD_PAGE_SIZE: u64 = 12;

#[derive(Clone)]
pub struct RecipeService {
    repo: Repository,
}

impl RecipeService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Public listing: live recipes with search, filter and sorting
    pub async fn list_published(&self, query: &RecipeListQuery) -> Result<RecipePage> {
        query.validate_fields()?;
        let (sort_by, sort_order) = query.sort();

        self.repo
            .list_recipes(&RecipeListParams {
                search: query.search_term(),
                author_id: None,
                sort_by,
                sort_order,
                page: query.page(),
                per_page: PUBLIC_PAGE_SIZE,
            })
            .await
    }

    /// Dashboard listing: the acting user's own recipes
    pub async fn list_for_author(
        &self,
        auth: &AuthContext,
        query: &RecipeListQuery,
    ) -> Result<RecipePage> {
        query.validate_fields()?;
        let (sort_by, sort_order) = query.sort();

        self.repo
            .list_recipes(&RecipeListParams {
                search: query.search_term(),
                author_id: Some(auth.user_id),
                sort_by,
                sort_order,
                page: query.page(),
                per_page: DASHBOARD_PAGE_SIZE,
            })
            .await
    }

    /// Fetch a live recipe by ID
    pub async fn get(&self, id: i64) -> Result<Recipe> {
        self.repo
            .find_recipe_by_id(id)
            .await?
            .ok_or(AppError::RecipeNotFound { id })
    }

    /// Fetch a live recipe by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Recipe> {
        self.repo
            .find_recipe_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "recipe".to_string(),
                id: slug.to_string(),
            })
    }

    /// Create a recipe owned by the acting user
    pub async fn create(&self, auth: &AuthContext, input: RecipeInput) -> Result<Recipe> {
        input.validate_fields()?;

        let draft = input.sanitize();
        check_draft(&draft)?;

        if self.repo.title_exists(&draft.title, None).await? {
            return Err(AppError::field("title", "This title is already in use"));
        }

        let recipe = self.repo.insert_recipe(auth.user_id, &draft).await?;

        info!(
            recipe_id = recipe.id,
            user_id = auth.user_id,
            title = %recipe.title,
            "Recipe created"
        );
        metrics::record_recipe_written("created");

        Ok(recipe)
    }

    /// Update a recipe's content. Only the author may update; the author
    /// itself is immutable.
    pub async fn update(&self, auth: &AuthContext, id: i64, input: RecipeInput) -> Result<Recipe> {
        let recipe = self.get(id).await?;
        authorize_author(auth, &recipe, "update")?;

        input.validate_fields()?;

        let draft = input.sanitize();
        check_draft(&draft)?;

        if self.repo.title_exists(&draft.title, Some(recipe.id)).await? {
            return Err(AppError::field("title", "This title is already in use"));
        }

        let recipe = self.repo.update_recipe(recipe, &draft).await?;

        info!(recipe_id = recipe.id, user_id = auth.user_id, "Recipe updated");
        metrics::record_recipe_written("updated");

        Ok(recipe)
    }

    /// Soft-delete a recipe. Only the author may delete; comment and
    /// rating rows are retained.
    pub async fn delete(&self, auth: &AuthContext, id: i64) -> Result<()> {
        let recipe = self.get(id).await?;
        authorize_author(auth, &recipe, "delete")?;

        self.repo.soft_delete_recipe(recipe).await?;

        info!(recipe_id = id, user_id = auth.user_id, "Recipe deleted");
        metrics::record_recipe_written("deleted");

        Ok(())
    }
}

/// The single authorization predicate this core needs: acting identity
/// must be the recipe's author.
fn authorize_author(auth: &AuthContext, recipe: &Recipe, action: &str) -> Result<()> {
    if recipe.user_id == auth.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden {
            message: format!("Only the author may {} this recipe", action),
        })
    }
}

/// Reject drafts whose structure degraded to empty during sanitization
/// (all-blank ingredients or steps survive raw validation).
fn check_draft(draft: &RecipeDraft) -> Result<()> {
    if draft.ingredients.is_empty() {
        return Err(AppError::field("ingredients", "Provide at least 1 ingredient"));
    }
    if draft.steps.is_empty() {
        return Err(AppError::field("steps", "The preparation steps are required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::StepsInput;

    fn recipe_owned_by(user_id: i64) -> Recipe {
        Recipe {
            id: 1,
            user_id,
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
        }
    }

    fn acting_user(user_id: i64) -> AuthContext {
        AuthContext {
            user_id,
            user_name: "alice".to_string(),
            request_id: "test".to_string(),
        }
    }

    #[test]
    fn test_author_may_act() {
        let recipe = recipe_owned_by(1);
        assert!(authorize_author(&acting_user(1), &recipe, "update").is_ok());
    }

    #[test]
    fn test_non_author_is_forbidden() {
        let recipe = recipe_owned_by(1);
        match authorize_author(&acting_user(2), &recipe, "update") {
            Err(AppError::Forbidden { .. }) => {}
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[test]
    fn test_draft_degraded_to_empty_is_rejected() {
        let input = RecipeInput {
            title: "valid title".to_string(),
            description: None,
            ingredients: vec!["Flour".to_string()],
            // Long enough for the raw length rule, but every line is blank.
            steps: StepsInput::Text("    \n    \n    ".to_string()),
        };
        // Raw shape passes the declarative rules...
        assert!(input.validate_fields().is_ok());

        // ...but the sanitized draft is structurally empty.
        let draft = input.sanitize();
        match check_draft(&draft) {
            Err(AppError::Validation { errors }) => {
                assert!(errors.contains_key("steps"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
