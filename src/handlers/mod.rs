//! HTTP handlers for the JSON API.
//!
//! Auth handlers live in `crate::auth::handlers`; everything else is here,
//! one module per resource.

pub mod chat;
pub mod groups;
pub mod plans;
pub mod progress;
pub mod quizzes;
pub mod sessions;
