//! Recipe management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::AppState;
use tastebook_common::{
    auth::AuthContext,
    db::models::Recipe,
    db::RecipePage,
    errors::Result,
    validate::{RecipeInput, RecipeListQuery},
};

/// A recipe as returned to clients
#[derive(Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub rating_avg: f64,
    pub rating_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            author_id: recipe.user_id,
            ingredients: recipe.ingredient_list(),
            steps: recipe.step_list(),
            title: recipe.title,
            slug: recipe.slug,
            description: recipe.description,
            rating_avg: recipe.rating_avg,
            rating_count: recipe.rating_count,
            created_at: recipe.created_at.to_rfc3339(),
            updated_at: recipe.updated_at.to_rfc3339(),
        }
    }
}

/// A page of recipes
#[derive(Serialize)]
pub struct RecipeListResponse {
    pub recipes: Vec<RecipeResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl From<RecipePage> for RecipeListResponse {
    fn from(page: RecipePage) -> Self {
        Self {
            recipes: page.recipes.into_iter().map(Into::into).collect(),
            total: page.total,
            page: page.page,
            per_page: page.per_page,
        }
    }
}

/// List live recipes with search, filtering and sorting
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<RecipeListResponse>> {
    let page = state.recipes.list_published(&query).await?;
    Ok(Json(page.into()))
}

/// List the authenticated user's own recipes
pub async fn dashboard_recipes(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<RecipeListResponse>> {
    let page = state.recipes.list_for_author(&auth, &query).await?;
    Ok(Json(page.into()))
}

/// Get a recipe by ID
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RecipeResponse>> {
    let recipe = state.recipes.get(id).await?;
    Ok(Json(recipe.into()))
}

/// Get a recipe by slug
pub async fn get_recipe_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<RecipeResponse>> {
    let recipe = state.recipes.get_by_slug(&slug).await?;
    Ok(Json(recipe.into()))
}

/// Create a new recipe
pub async fn create_recipe(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<RecipeInput>,
) -> Result<(StatusCode, Json<RecipeResponse>)> {
    let recipe = state.recipes.create(&auth, input).await?;
    Ok((StatusCode::CREATED, Json(recipe.into())))
}

/// Update an existing recipe (author only)
pub async fn update_recipe(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(input): Json<RecipeInput>,
) -> Result<Json<RecipeResponse>> {
    let recipe = state.recipes.update(&auth, id, input).await?;
    Ok(Json(recipe.into()))
}

/// Soft-delete a recipe (author only)
pub async fn delete_recipe(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.recipes.delete(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
