//! Domain services
//!
//! Each service owns one write path: validation, sanitization, the store
//! transaction, and post-commit notification dispatch, in that order.
//! Identity is always an explicit [`crate::auth::AuthContext`] argument.

mod comment;
mod notification;
mod rating;
mod recipe;

pub use comment::{CommentService, COMMENTS_PAGE_SIZE};
pub use notification::NotificationService;
pub use rating::RatingService;
pub use recipe::{RecipeService, DASHBOARD_PAGE_SIZE, PUBLIC_PAGE_SIZE};
