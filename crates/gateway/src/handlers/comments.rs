//! Comment handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use tastebook_common::{
    auth::AuthContext,
    db::models::Comment,
    errors::Result,
    validate::CommentInput,
};

#[derive(Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub recipe_id: i64,
    pub user_id: i64,
    pub body: String,
    pub created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            recipe_id: comment.recipe_id,
            user_id: comment.user_id,
            body: comment.body,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
    pub total: u64,
}

#[derive(Deserialize)]
pub struct CommentListQuery {
    /// 1-based page number
    pub page: Option<u64>,
}

/// List comments on a recipe, newest first
pub async fn list_comments(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
    Query(query): Query<CommentListQuery>,
) -> Result<Json<CommentListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let (comments, total) = state.comments.list(recipe_id, page).await?;

    Ok(Json(CommentListResponse {
        comments: comments.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Post a comment on a recipe
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<CommentInput>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    let comment = state.comments.create(&auth, input).await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// Delete a comment (author only)
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.comments.delete(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
