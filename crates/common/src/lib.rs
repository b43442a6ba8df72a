//! Tastebook Common Library
//!
//! Shared types, utilities, and infrastructure for the Tastebook
//! recipe-sharing services.

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod notify;
pub mod sanitize;
pub mod services;
pub mod validate;

// Re-export commonly used types
pub use auth::{AuthContext, JwtManager, JwtState};
pub use config::AppConfig;
pub use db::{DbPool, RatingAggregate, RatingOutcome, RecipePage, Repository};
pub use errors::{AppError, ErrorCode, FieldErrors, Result};
pub use notify::{DatabaseNotifier, NotificationEvent, NotificationKind, Notifier};

/// Version of the common library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
