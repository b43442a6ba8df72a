//! Declarative per-field validation for incoming payloads
//!
//! Validation always runs before sanitization and before any store
//! mutation. Failures produce an ordered field -> message map carried in
//! [`AppError::Validation`] so the caller can re-render the form with
//! per-field annotations; they never raise a generic error.

use crate::errors::{AppError, FieldErrors, Result};
use crate::sanitize::{self, StepsInput};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Maximum characters per ingredient entry
const INGREDIENT_MAX_CHARS: usize = 255;

/// Raw (pre-split) preparation steps bounds
const STEPS_MIN_CHARS: usize = 10;
const STEPS_MAX_CHARS: usize = 2000;

/// Payload for creating or updating a recipe
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecipeInput {
    #[validate(length(min = 3, max = 120, message = "The title must be between 3 and 120 characters"))]
    pub title: String,

    #[validate(length(max = 500, message = "The description may not be greater than 500 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 20, message = "Provide between 1 and 20 ingredients"))]
    pub ingredients: Vec<String>,

    pub steps: StepsInput,
}

impl RecipeInput {
    /// Run the declarative rules plus the structural checks the derive
    /// cannot express (per-item ingredient length, raw steps length).
    pub fn validate_fields(&self) -> Result<()> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => field_errors(&e),
        };

        for (index, ingredient) in self.ingredients.iter().enumerate() {
            let field = format!("ingredients[{}]", index);
            if ingredient.trim().is_empty() {
                errors.entry(field).or_insert_with(|| "Each ingredient is required".to_string());
            } else if ingredient.chars().count() > INGREDIENT_MAX_CHARS {
                errors.entry(field).or_insert_with(|| {
                    "Each ingredient may not be greater than 255 characters".to_string()
                });
            }
        }

        let steps_len = self.steps.raw_len();
        if !(STEPS_MIN_CHARS..=STEPS_MAX_CHARS).contains(&steps_len) {
            errors.insert(
                "steps".to_string(),
                "The preparation steps must be between 10 and 2000 characters".to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation { errors })
        }
    }

    /// Sanitize the validated input into its canonical persisted form
    pub fn sanitize(&self) -> RecipeDraft {
        let title = sanitize::sanitize_title(&self.title);
        let slug = sanitize::slugify(&title);

        RecipeDraft {
            slug,
            description: sanitize::sanitize_description(self.description.as_deref()),
            ingredients: sanitize::sanitize_ingredients(&self.ingredients),
            steps: sanitize::sanitize_steps(&self.steps),
            title,
        }
    }
}

/// Canonical, storage-ready recipe fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

/// Payload for creating a comment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentInput {
    pub recipe_id: i64,

    #[validate(length(min = 1, max = 1000, message = "The comment must be between 1 and 1000 characters"))]
    pub body: String,
}

impl CommentInput {
    pub fn validate_fields(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::Validation { errors: field_errors(&e) })
    }
}

/// Payload for submitting a rating
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RatingInput {
    pub recipe_id: i64,

    #[validate(range(min = 1, max = 5, message = "The score must be between 1 and 5 stars"))]
    pub score: i16,
}

impl RatingInput {
    pub fn validate_fields(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::Validation { errors: field_errors(&e) })
    }
}

/// Sortable recipe columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    CreatedAt,
    Title,
    RatingAvg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Quick-filter presets carried by the listing UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeFilter {
    Date,
    Title,
    Rating,
}

/// Query parameters for recipe listings
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RecipeListQuery {
    #[validate(length(max = 100, message = "The search term may not be greater than 100 characters"))]
    pub search: Option<String>,

    pub filter: Option<RecipeFilter>,

    pub sort_by: Option<SortBy>,

    pub sort_order: Option<SortOrder>,

    /// 1-based page number
    pub page: Option<u64>,
}

impl RecipeListQuery {
    pub fn validate_fields(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::Validation { errors: field_errors(&e) })
    }

    /// Trimmed search term, dropped when empty
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    /// Resolve the effective sort. An explicit `sort_by` wins and defaults
    /// to descending; otherwise the filter preset picks its natural
    /// ordering; the fallback is newest-first.
    pub fn sort(&self) -> (SortBy, SortOrder) {
        if let Some(sort_by) = self.sort_by {
            return (sort_by, self.sort_order.unwrap_or(SortOrder::Desc));
        }

        match self.filter {
            Some(RecipeFilter::Title) => (SortBy::Title, self.sort_order.unwrap_or(SortOrder::Asc)),
            Some(RecipeFilter::Rating) => {
                (SortBy::RatingAvg, self.sort_order.unwrap_or(SortOrder::Desc))
            }
            Some(RecipeFilter::Date) | None => {
                (SortBy::CreatedAt, self.sort_order.unwrap_or(SortOrder::Desc))
            }
        }
    }

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Flatten `validator` errors into an ordered field -> message map,
/// keeping the first message per field
pub fn field_errors(errors: &validator::ValidationErrors) -> FieldErrors {
    let mut map = FieldErrors::new();

    for (field, field_errs) in errors.field_errors() {
        if let Some(err) = field_errs.first() {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for {}", field));
            map.insert(field.to_string(), message);
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_recipe() -> RecipeInput {
        RecipeInput {
            title: "Chocolate Cake".to_string(),
            description: Some("Rich and moist".to_string()),
            ingredients: vec!["Flour".to_string(), "Sugar".to_string()],
            steps: StepsInput::Text("Mix ingredients\nBake for 30 minutes".to_string()),
        }
    }

    #[test]
    fn test_valid_recipe_passes() {
        assert!(valid_recipe().validate_fields().is_ok());
    }

    #[test]
    fn test_short_title_rejected_with_field_message() {
        let mut input = valid_recipe();
        input.title = "ab".to_string();

        match input.validate_fields() {
            Err(AppError::Validation { errors }) => {
                assert_eq!(
                    errors.get("title").map(String::as_str),
                    Some("The title must be between 3 and 120 characters")
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_ingredients_rejected() {
        let mut input = valid_recipe();
        input.ingredients = vec![];

        match input.validate_fields() {
            Err(AppError::Validation { errors }) => {
                assert!(errors.contains_key("ingredients"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_ingredient_item_rejected() {
        let mut input = valid_recipe();
        input.ingredients = vec!["a".repeat(256)];

        match input.validate_fields() {
            Err(AppError::Validation { errors }) => {
                assert!(errors.contains_key("ingredients[0]"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_steps_raw_length_bounds() {
        let mut input = valid_recipe();
        input.steps = StepsInput::Text("too short".to_string());

        match input.validate_fields() {
            Err(AppError::Validation { errors }) => {
                assert!(errors.contains_key("steps"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_runs_before_sanitization() {
        // A title of whitespace-padded length 125 fails validation even
        // though sanitization would shrink it.
        let mut input = valid_recipe();
        input.title = format!("ab{}", " ".repeat(123));
        assert!(input.validate_fields().is_err());
    }

    #[test]
    fn test_sanitize_produces_canonical_draft() {
        let input = RecipeInput {
            title: "  Chocolate   CAKE ".to_string(),
            description: Some("  ".to_string()),
            ingredients: vec!["Sugar".to_string(), "sugar".to_string(), "SUGAR ".to_string()],
            steps: StepsInput::Text("Mix ingredients\nBake for 30 minutes".to_string()),
        };

        let draft = input.sanitize();
        assert_eq!(draft.title, "chocolate cake");
        assert_eq!(draft.slug, "chocolate-cake");
        assert_eq!(draft.description, None);
        assert_eq!(draft.ingredients, vec!["Sugar"]);
        assert_eq!(
            draft.steps,
            vec!["Step 1: Mix ingredients", "Step 2: Bake for 30 minutes"]
        );
    }

    #[test]
    fn test_comment_body_bounds() {
        let input = CommentInput {
            recipe_id: 1,
            body: "".to_string(),
        };
        assert!(input.validate_fields().is_err());

        let input = CommentInput {
            recipe_id: 1,
            body: "x".repeat(1001),
        };
        assert!(input.validate_fields().is_err());

        let input = CommentInput {
            recipe_id: 1,
            body: "Great recipe!".to_string(),
        };
        assert!(input.validate_fields().is_ok());
    }

    #[test]
    fn test_score_bounds() {
        for score in [0, 6, -1] {
            let input = RatingInput { recipe_id: 1, score };
            assert!(input.validate_fields().is_err(), "score {score} should fail");
        }
        for score in 1..=5 {
            let input = RatingInput { recipe_id: 1, score };
            assert!(input.validate_fields().is_ok());
        }
    }

    #[test]
    fn test_list_query_filter_sort_defaults() {
        let query = RecipeListQuery {
            filter: Some(RecipeFilter::Rating),
            ..Default::default()
        };
        assert_eq!(query.sort(), (SortBy::RatingAvg, SortOrder::Desc));

        let query = RecipeListQuery {
            filter: Some(RecipeFilter::Title),
            ..Default::default()
        };
        assert_eq!(query.sort(), (SortBy::Title, SortOrder::Asc));

        let query = RecipeListQuery::default();
        assert_eq!(query.sort(), (SortBy::CreatedAt, SortOrder::Desc));

        // Explicit sort wins over the filter preset.
        let query = RecipeListQuery {
            filter: Some(RecipeFilter::Rating),
            sort_by: Some(SortBy::Title),
            sort_order: Some(SortOrder::Desc),
            ..Default::default()
        };
        assert_eq!(query.sort(), (SortBy::Title, SortOrder::Desc));
    }

    #[test]
    fn test_explicit_sort_by_defaults_to_descending() {
        // Without an explicit order, every sort_by column descends; only
        // the title *filter preset* implies ascending.
        let query = RecipeListQuery {
            sort_by: Some(SortBy::Title),
            ..Default::default()
        };
        assert_eq!(query.sort(), (SortBy::Title, SortOrder::Desc));

        let query = RecipeListQuery {
            sort_by: Some(SortBy::RatingAvg),
            ..Default::default()
        };
        assert_eq!(query.sort(), (SortBy::RatingAvg, SortOrder::Desc));

        let query = RecipeListQuery {
            sort_by: Some(SortBy::Title),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        };
        assert_eq!(query.sort(), (SortBy::Title, SortOrder::Asc));
    }

    #[test]
    fn test_search_term_trimmed() {
        let query = RecipeListQuery {
            search: Some("  cake  ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.search_term(), Some("cake".to_string()));

        let query = RecipeListQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.search_term(), None);
    }
}
