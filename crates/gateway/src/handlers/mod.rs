//! HTTP request handlers

pub mod comments;
pub mod health;
pub mod notifications;
pub mod ratings;
pub mod recipes;
