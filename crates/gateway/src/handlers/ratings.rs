//! Rating handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;
use tastebook_common::{auth::AuthContext, errors::Result, validate::RatingInput};

/// Response after submitting a rating
#[derive(Serialize)]
pub struct RatingResponse {
    pub rating_id: i64,
    pub score: i16,
    /// Recipe-wide average after this submission, rounded to 2 decimals
    pub new_average: f64,
    pub total_ratings: i64,
    /// True when this user rated the recipe for the first time
    pub was_created: bool,
}

/// Submit or revise a rating for a recipe
pub async fn rate_recipe(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<RatingInput>,
) -> Result<(StatusCode, Json<RatingResponse>)> {
    let outcome = state.ratings.rate(&auth, input).await?;

    let status = if outcome.newly_created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(RatingResponse {
            rating_id: outcome.rating.id,
            score: outcome.rating.score,
            new_average: outcome.aggregate.average,
            total_ratings: outcome.aggregate.count,
            was_created: outcome.newly_created,
        }),
    ))
}
