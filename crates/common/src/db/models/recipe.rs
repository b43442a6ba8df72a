//! Recipe entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Owning author; immutable after creation
    pub user_id: i64,

    /// Canonical form: trimmed, whitespace-collapsed, lower-cased.
    /// Unique among non-deleted recipes (case-insensitive).
    #[sea_orm(column_type = "Text")]
    pub title: String,

    /// Derived from the title at write time; cosmetic, not unique
    #[sea_orm(column_type = "Text")]
    pub slug: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Ordered, deduplicated, title-cased ingredient names as JSONB
    #[sea_orm(column_type = "JsonBinary")]
    pub ingredients: Json,

    /// Ordered, prefixed preparation steps as JSONB
    #[sea_orm(column_type = "JsonBinary")]
    pub steps: Json,

    /// Always equals ROUND(AVG(score), 2) over this recipe's rating rows;
    /// 0 when no ratings exist. Maintained by the rating aggregator.
    #[sea_orm(column_type = "Double")]
    pub rating_avg: f64,

    /// Always equals COUNT(*) over this recipe's rating rows
    pub rating_count: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,

    /// Soft-delete marker; the recipe is logically invisible once set
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    #[sea_orm(has_many = "super::rating::Entity")]
    Ratings,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Ingredients as a plain string list
    pub fn ingredient_list(&self) -> Vec<String> {
        serde_json::from_value(self.ingredients.clone()).unwrap_or_default()
    }

    /// Steps as a plain string list
    pub fn step_list(&self) -> Vec<String> {
        serde_json::from_value(self.steps.clone()).unwrap_or_default()
    }
}
