//! Notification entity
//!
//! Delivered notifications land here as rows; the recipient reads them from
//! their inbox. Rows are written by the notifier outside the transaction
//! that triggered them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Recipient user
    pub user_id: i64,

    /// Event kind: "new_comment" or "new_rating"
    #[sea_orm(column_type = "Text")]
    pub kind: String,

    /// Event payload as JSONB
    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,

    pub read_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
