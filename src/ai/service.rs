//! Provider orchestration with structured fallback.
//!
//! `AiService` owns the ordered provider chain. Every generation call walks
//! the chain; invalid responses are treated exactly like transport failures
//! and the next provider is tried. Exhausting the chain falls through to the
//! deterministic templates in [`fallback`], so callers always get content
//! and never see a provider error.

use std::sync::Arc;

use crate::config::AiConfig;
use crate::domain::{ChatRole, Difficulty};

use super::fallback;
use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::provider::AiProvider;
use super::{GeneratedPlan, GeneratedQuiz};

/// Source tag recorded on persisted content
pub const FALLBACK_SOURCE: &str = "fallback";

pub struct AiService {
    providers: Vec<Arc<dyn AiProvider>>,
}

impl AiService {
    /// Build the chain from config. Providers without an API key are skipped.
    pub fn from_config(config: &AiConfig) -> Self {
        let mut providers: Vec<Arc<dyn AiProvider>> = Vec::new();

        for name in &config.provider_order {
            match name.as_str() {
                "openai" => {
                    if let Some(key) = &config.openai_api_key {
                        providers.push(Arc::new(OpenAiProvider::new(
                            key.clone(),
                            config.openai_model.clone(),
                        )));
                    } else {
                        tracing::info!("openai provider skipped: no API key configured");
                    }
                }
                "gemini" => {
                    if let Some(key) = &config.gemini_api_key {
                        providers.push(Arc::new(GeminiProvider::new(
                            key.clone(),
                            config.gemini_model.clone(),
                        )));
                    } else {
                        tracing::info!("gemini provider skipped: no API key configured");
                    }
                }
                other => tracing::warn!("unknown AI provider '{}' in provider order", other),
            }
        }

        if providers.is_empty() {
            tracing::info!("no AI providers configured; all generation uses fallback templates");
        }

        Self { providers }
    }

    /// Build a service from explicit providers (tests)
    pub fn with_providers(providers: Vec<Arc<dyn AiProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Walk the chain; `parse` validates each raw response. Returns the first
    /// valid result with its source tag, or None when the chain is exhausted.
    async fn try_providers<T>(
        &self,
        system: &str,
        prompt: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<(T, String)> {
        for provider in &self.providers {
            match provider.complete(system, prompt).await {
                Ok(text) => match parse(&text) {
                    Some(value) => {
                        return Some((value, format!("provider:{}", provider.name())));
                    }
                    None => {
                        tracing::warn!(
                            "provider {} returned an unusable response, trying next",
                            provider.name()
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!("provider {} failed: {}, trying next", provider.name(), e);
                }
            }
        }
        None
    }

    /// Generate a study plan. Always succeeds; the source tag records
    /// whether a provider or the fallback produced it.
    pub async fn generate_study_plan(
        &self,
        subject: &str,
        duration_days: i64,
        difficulty: Difficulty,
        hours_per_day: f64,
    ) -> (GeneratedPlan, String) {
        let system = "You are a study-plan designer. Respond with a single JSON object and \
                      no prose around it.";
        let prompt = format!(
            "Create a {duration}-day study plan for \"{subject}\" at {difficulty} level, \
             about {hours} hours per day. Respond as JSON: {{\"subject\": \"...\", \
             \"overview\": \"...\", \"days\": [{{\"day\": 1, \"title\": \"...\", \
             \"topics\": [\"...\"], \"activities\": [\"...\"], \"estimated_minutes\": 60}}]}} \
             with exactly {duration} entries in \"days\".",
            duration = duration_days,
            subject = subject,
            difficulty = difficulty.as_str(),
            hours = hours_per_day,
        );

        let result = self
            .try_providers(system, &prompt, |text| parse_plan(text, duration_days))
            .await;

        match result {
            Some((plan, source)) => (plan, source),
            None => (
                fallback::study_plan(subject, duration_days, difficulty, hours_per_day),
                FALLBACK_SOURCE.to_string(),
            ),
        }
    }

    /// Generate a multiple-choice quiz. Always succeeds.
    pub async fn generate_quiz(
        &self,
        topic: &str,
        question_count: i64,
        difficulty: Difficulty,
    ) -> (GeneratedQuiz, String) {
        let system = "You are a quiz writer. Respond with a single JSON object and no prose \
                      around it.";
        let prompt = format!(
            "Write a {count}-question multiple-choice quiz on \"{topic}\" at {difficulty} \
             level. Respond as JSON: {{\"topic\": \"...\", \"questions\": [{{\"prompt\": \
             \"...\", \"options\": [\"a\", \"b\", \"c\", \"d\"], \"correct_index\": 0, \
             \"explanation\": \"...\"}}]}} with exactly {count} questions, each with \
             exactly 4 options.",
            count = question_count,
            topic = topic,
            difficulty = difficulty.as_str(),
        );

        let result = self
            .try_providers(system, &prompt, |text| parse_quiz(text, question_count))
            .await;

        match result {
            Some((quiz, source)) => (quiz, source),
            None => (
                fallback::quiz(topic, question_count, difficulty),
                FALLBACK_SOURCE.to_string(),
            ),
        }
    }

    /// Produce an assistant reply for a chat turn. Always succeeds.
    pub async fn chat(
        &self,
        history: &[(ChatRole, String)],
        message: &str,
        subject_hint: Option<&str>,
    ) -> (String, String) {
        let system = match subject_hint {
            Some(subject) => format!(
                "You are a patient study tutor helping with {}. Answer concisely.",
                subject
            ),
            None => "You are a patient study tutor. Answer concisely.".to_string(),
        };

        // Flatten prior turns into the prompt; providers here are plain
        // completion endpoints without threaded history.
        let mut prompt = String::new();
        for (role, body) in history {
            prompt.push_str(role.as_str());
            prompt.push_str(": ");
            prompt.push_str(body);
            prompt.push('\n');
        }
        prompt.push_str("user: ");
        prompt.push_str(message);

        let result = self
            .try_providers(&system, &prompt, |text| {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .await;

        match result {
            Some(reply) => reply,
            None => (
                fallback::chat_reply(message, subject_hint),
                FALLBACK_SOURCE.to_string(),
            ),
        }
    }
}

/// Extract the outermost JSON object from provider prose. Handles bare JSON
/// and markdown code fences.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse and validate a plan response: correct day count, days renumbered
/// 1..=n in order, non-empty titles and topics.
fn parse_plan(text: &str, duration_days: i64) -> Option<GeneratedPlan> {
    let json = extract_json(text)?;
    let mut plan: GeneratedPlan = serde_json::from_str(json).ok()?;

    if plan.days.len() as i64 != duration_days || plan.subject.trim().is_empty() {
        return None;
    }
    for (i, day) in plan.days.iter_mut().enumerate() {
        if day.title.trim().is_empty() || day.topics.is_empty() {
            return None;
        }
        // Providers sometimes zero-base or misnumber days
        day.day = i as i64 + 1;
        if day.estimated_minutes <= 0 {
            day.estimated_minutes = 60;
        }
    }
    Some(plan)
}

/// Parse and validate a quiz response: correct question count, exactly four
/// options each, correct_index in range.
fn parse_quiz(text: &str, question_count: i64) -> Option<GeneratedQuiz> {
    let json = extract_json(text)?;
    let quiz: GeneratedQuiz = serde_json::from_str(json).ok()?;

    if quiz.questions.len() as i64 != question_count || quiz.topic.trim().is_empty() {
        return None;
    }
    for q in &quiz.questions {
        if q.prompt.trim().is_empty()
            || q.options.len() != 4
            || !(0..4).contains(&q.correct_index)
        {
            return None;
        }
    }
    Some(quiz)
}
