//! AI content generation: a provider chain with structured fallback.
//!
//! Generation requests walk the configured providers in order. A provider
//! failure, or a response that does not parse into the expected shape, is a
//! soft failure: it is logged and the next provider is tried. When the whole
//! chain is exhausted the service synthesizes deterministic templated
//! content, so generation never fails from the caller's point of view.

pub mod fallback;
pub mod gemini;
pub mod openai;
pub mod provider;
pub mod service;

pub use provider::{AiProvider, ProviderError};
pub use service::AiService;

use serde::{Deserialize, Serialize};

/// A study plan produced by a provider or the fallback templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub subject: String,
    pub overview: String,
    pub days: Vec<GeneratedPlanDay>,
}

/// One day of generated plan content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPlanDay {
    pub day: i64,
    pub title: String,
    pub topics: Vec<String>,
    pub activities: Vec<String>,
    #[serde(default = "default_estimated_minutes")]
    pub estimated_minutes: i64,
}

fn default_estimated_minutes() -> i64 {
    60
}

/// A quiz produced by a provider or the fallback templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuiz {
    pub topic: String,
    pub questions: Vec<GeneratedQuestion>,
}

/// A four-option multiple-choice question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: i64,
    #[serde(default)]
    pub explanation: String,
}
