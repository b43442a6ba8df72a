//! SeaORM entity models
//!
//! Database entities for Tastebook

mod comment;
mod notification;
mod rating;
mod recipe;

pub use recipe::{
    Entity as RecipeEntity,
    Model as Recipe,
    ActiveModel as RecipeActiveModel,
    Column as RecipeColumn,
};

pub use comment::{
    Entity as CommentEntity,
    Model as Comment,
    ActiveModel as CommentActiveModel,
    Column as CommentColumn,
};

pub use rating::{
    Entity as RatingEntity,
    Model as Rating,
    ActiveModel as RatingActiveModel,
    Column as RatingColumn,
};

pub use notification::{
    Entity as NotificationEntity,
    Model as Notification,
    ActiveModel as NotificationActiveModel,
    Column as NotificationColumn,
};
