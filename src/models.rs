use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of every AI-generated record (documents' summaries, quizzes,
/// learning plans, video summaries). Transitions only move forward:
/// pending -> processing -> completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Processing => "processing",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(GenerationStatus::Pending),
            "processing" => Some(GenerationStatus::Processing),
            "completed" => Some(GenerationStatus::Completed),
            "failed" => Some(GenerationStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }

    /// A status may only advance. Completed and failed are final; processing
    /// may not return to pending; a terminal state never changes again.
    pub fn can_transition_to(&self, next: GenerationStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (GenerationStatus::Pending, GenerationStatus::Processing)
                | (GenerationStatus::Pending, GenerationStatus::Completed)
                | (GenerationStatus::Pending, GenerationStatus::Failed)
                | (GenerationStatus::Processing, GenerationStatus::Completed)
                | (GenerationStatus::Processing, GenerationStatus::Failed)
        )
    }
}

/// One of the four answer slots of a multiple-choice question. Serialized as
/// the lowercase letter the UI contract expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerOption {
    A,
    B,
    C,
    D,
}

impl AnswerOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerOption::A => "a",
            AnswerOption::B => "b",
            AnswerOption::C => "c",
            AnswerOption::D => "d",
        }
    }

    /// Case-insensitive, tolerates surrounding whitespace and a trailing
    /// parenthesis or dot ("B)", "c."). Anything else is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().trim_end_matches([')', '.', ':']).trim();
        match normalized.to_lowercase().as_str() {
            "a" => Some(AnswerOption::A),
            "b" => Some(AnswerOption::B),
            "c" => Some(AnswerOption::C),
            "d" => Some(AnswerOption::D),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub summary_status: GenerationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub document_id: Uuid,
    pub title: String,
    pub question_count: i64,
    pub status: GenerationStatus,
    pub created_at: DateTime<Utc>,
}

/// Immutable after creation; there is deliberately no update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub position: i64,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: AnswerOption,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub user_id: String,
    pub score: i64,
    pub total: i64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub selected_answer: Option<AnswerOption>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPlan {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub user_id: String,
    pub summary: String,
    pub roadmap: String,
    pub status: GenerationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningResource {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub position: i64,
    pub topic: String,
    pub description: String,
    pub url: Option<String>,
    pub resource_type: Option<String>,
    pub priority: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: Uuid,
    pub source_url: String,
    pub video_id: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub actionable_takeaways: Vec<String>,
    pub status: GenerationStatus,
    pub saved: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Wire contracts shared between the AI gateway, the response parser, and the
// persistence layer. The serialized field names are part of the UI contract
// and must not change.
// ---------------------------------------------------------------------------

/// One quiz question as produced by the backend and consumed by the UI:
/// `{question, option_a..option_d, correct_answer}` with a lowercase letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuestion {
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: AnswerOption,
}

/// `{summary, key_points, actionable_takeaways}` — the video summary record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummaryContent {
    pub summary: String,
    pub key_points: Vec<String>,
    pub actionable_takeaways: Vec<String>,
}

/// Everything the learning-plan generator gets back from the backend before
/// roadmap post-processing and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub summary: String,
    pub roadmap: Option<String>,
    pub topics: Vec<PlanTopic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTopic {
    pub topic: String,
    pub description: String,
    pub priority: Option<i64>,
    pub resources: Vec<PlanResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResource {
    pub description: String,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
}

/// An answer the user got wrong, paired with its question context. Input to
/// remediation prompting and to fallback roadmap synthesis.
#[derive(Debug, Clone)]
pub struct IncorrectAnswer {
    pub question: String,
    pub selected_answer: Option<AnswerOption>,
    pub correct_answer: AnswerOption,
}

// ---------------------------------------------------------------------------
// Request / response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuizRequest {
    pub title: Option<String>,
    pub question_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAttemptRequest {
    pub user_id: String,
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub selected_answer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideoSummaryRequest {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveVideoSummaryRequest {
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizWithQuestions {
    pub quiz: Quiz,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptWithAnswers {
    pub attempt: QuizAttempt,
    pub answers: Vec<QuizAnswer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanWithResources {
    pub plan: LearningPlan,
    pub resources: Vec<LearningResource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_progression_is_forward_only() {
        use GenerationStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));

        // No regression, no leaving a terminal state.
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Failed.can_transition_to(Pending));
    }

    #[test]
    fn test_status_round_trips_through_storage_form() {
        for status in [
            GenerationStatus::Pending,
            GenerationStatus::Processing,
            GenerationStatus::Completed,
            GenerationStatus::Failed,
        ] {
            assert_eq!(GenerationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(GenerationStatus::parse("archived"), None);
    }

    #[test]
    fn test_answer_option_parsing() {
        assert_eq!(AnswerOption::parse("a"), Some(AnswerOption::A));
        assert_eq!(AnswerOption::parse("B"), Some(AnswerOption::B));
        assert_eq!(AnswerOption::parse(" c) "), Some(AnswerOption::C));
        assert_eq!(AnswerOption::parse("D."), Some(AnswerOption::D));
        assert_eq!(AnswerOption::parse("e"), None);
        assert_eq!(AnswerOption::parse("ab"), None);
        assert_eq!(AnswerOption::parse(""), None);
    }

    #[test]
    fn test_parsed_question_serializes_to_ui_contract() {
        let question = ParsedQuestion {
            question: "What is ownership?".to_string(),
            option_a: "A GC strategy".to_string(),
            option_b: "A compile-time memory discipline".to_string(),
            option_c: "A runtime borrow table".to_string(),
            option_d: "A linker feature".to_string(),
            correct_answer: AnswerOption::B,
        };

        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["correct_answer"], "b");
        assert!(value.get("option_a").is_some());
        assert!(value.get("option_d").is_some());
    }
}
