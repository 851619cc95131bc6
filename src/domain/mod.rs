pub mod conversation;
pub mod group;
pub mod plan;
pub mod quiz;

pub use conversation::{ChatRole, Conversation, ConversationMessage};
pub use group::{GroupMessage, StudyGroup};
pub use plan::{PlanDay, StudyPlan};
pub use quiz::{Quiz, QuizAttempt, QuizQuestion};

use serde::{Deserialize, Serialize};

/// Difficulty level shared by study plans and quizzes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Beginner
    }
}
