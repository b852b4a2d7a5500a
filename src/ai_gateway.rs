//! Prompt construction and backend orchestration.
//!
//! The gateway owns everything between a domain request ("summarize this
//! document") and a validated structured result: input truncation, prompt
//! text, the retry-on-refusal pass, degradation to the simulated backend on
//! transport failure, and the tiered response parsers. No state is retained
//! between calls.

use regex::Regex;
use std::sync::LazyLock;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::{
    ai_backend::{SimulatedBackend, TextBackend},
    config::AiConfig,
    errors::{ApiError, ApiResult},
    log_ai_operation,
    models::{GeneratedPlan, IncorrectAnswer, ParsedQuestion, VideoSummaryContent},
    response_parser,
};

/// Input bounds keep prompts inside the backend's context budget.
pub const SUMMARY_INPUT_LIMIT: usize = 60_000;
pub const QUIZ_INPUT_LIMIT: usize = 30_000;

const TRUNCATION_MARKER: &str = "\n\n[content truncated]";
const MIN_PLAUSIBLE_SUMMARY_CHARS: usize = 200;

const REFUSAL_PHRASES: [&str; 7] = [
    "i cannot",
    "i can't",
    "i am unable",
    "i'm unable",
    "as an ai",
    "i'm sorry",
    "cannot assist",
];

static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"youtu\.be/([A-Za-z0-9_-]{11})",
        r"youtube\.com/watch\?(?:.*&)?v=([A-Za-z0-9_-]{11})",
        r"youtube\.com/embed/([A-Za-z0-9_-]{11})",
        r"youtube\.com/shorts/([A-Za-z0-9_-]{11})",
        r"youtube\.com/v/([A-Za-z0-9_-]{11})",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

/// Derive the platform video identifier from a URL, matching the known URL
/// shapes. `None` means the input must be rejected before any AI call.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|capture| capture.get(1))
        .map(|m| m.as_str().to_string())
}

/// Character-bounded truncation with an explicit marker when content is cut.
pub fn truncate_input(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// A summary is suspicious when it is shorter than a useful minimum or reads
/// like a generic refusal.
pub fn is_suspicious_summary(text: &str) -> bool {
    if text.trim().chars().count() < MIN_PLAUSIBLE_SUMMARY_CHARS {
        return true;
    }
    let lowered = text.to_lowercase();
    REFUSAL_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

pub fn build_summary_prompt(document_text: &str) -> String {
    format!(
        r#"You are a study assistant. Write a thorough summary of the following document for a student preparing to be quizzed on it. Cover the main argument, the key supporting points, and any definitions or formulas the reader is expected to retain. Respond with prose only.

Document:
{}"#,
        document_text
    )
}

/// Alternate prompt used after a suspicious first response: pushes for
/// concrete extraction instead of open-ended summarization.
pub fn build_retry_summary_prompt(document_text: &str) -> String {
    format!(
        r#"Extract the concrete content of the following document: list and explain every major claim, definition, and conclusion it actually states. Do not evaluate the request, do not apologize, and do not add commentary about the task. Respond with prose only.

Document:
{}"#,
        document_text
    )
}

pub fn build_quiz_prompt(document_text: &str, question_count: usize) -> String {
    format!(
        r#"Generate exactly {} multiple-choice questions testing understanding of the document below.

Respond ONLY with a strict JSON array, no surrounding prose, in this exact shape:
[
  {{
    "question": "Question text",
    "option_a": "First option",
    "option_b": "Second option",
    "option_c": "Third option",
    "option_d": "Fourth option",
    "correct_answer": "a"
  }}
]

Rules:
- correct_answer must be exactly one of "a", "b", "c", "d"
- every question must have all four options
- questions must be answerable from the document alone

Document:
{}"#,
        question_count, document_text
    )
}

pub fn build_video_prompt(url: &str, video_id: &str) -> String {
    format!(
        r#"Summarize the YouTube video with id "{}" (url: {}).

Respond ONLY with a strict JSON object, no surrounding prose, in this exact shape:
{{
  "summary": "Two or three paragraphs summarizing the video",
  "key_points": ["point", "point", "point"],
  "actionable_takeaways": ["takeaway", "takeaway", "takeaway"]
}}"#,
        video_id, url
    )
}

pub fn build_plan_prompt(document_text: &str, incorrect: &[IncorrectAnswer]) -> String {
    let missed = incorrect
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            format!(
                "{}. {} (selected: {}, correct: {})",
                i + 1,
                answer.question,
                answer
                    .selected_answer
                    .map(|option| option.as_str())
                    .unwrap_or("none"),
                answer.correct_answer.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"A student answered the following quiz questions incorrectly:
{}

Using the source document below, produce a remediation plan. Respond ONLY with a strict JSON object in this exact shape:
{{
  "summary": "Encouraging prose summary of what to focus on",
  "roadmap": "A mermaid mindmap: first line 'mindmap', then '  root((Study Plan))', topics indented four spaces, subtopics six",
  "topics": [
    {{
      "topic": "Topic name",
      "description": "Why this topic needs review",
      "priority": 1,
      "resources": [
        {{"description": "Concrete study action", "url": null, "type": "reading"}}
      ]
    }}
  ]
}}

Document:
{}"#,
        missed, document_text
    )
}

/// The gateway pairs the configured backend with a simulated fallback used
/// whenever the primary fails or keeps refusing.
#[derive(Clone)]
pub struct AiGateway {
    backend: TextBackend,
    fallback: SimulatedBackend,
}

impl AiGateway {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            backend: TextBackend::from_config(config),
            fallback: SimulatedBackend::new(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Summarize a document. Never fails: transport errors and persistently
    /// suspicious output degrade to the simulated backend's summary.
    pub async fn summarize(&self, document_text: &str) -> String {
        let input = truncate_input(document_text, SUMMARY_INPUT_LIMIT);
        let prompt = build_summary_prompt(&input);
        log_ai_operation!(start, "summarize", backend = self.backend.name());

        let first = match self.backend.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                log_ai_operation!(error, "summarize", backend = self.backend.name(), error = e);
                return self.fallback.render(&prompt);
            }
        };
        if !is_suspicious_summary(&first) {
            log_ai_operation!(
                success,
                "summarize",
                backend = self.backend.name(),
                response_length = first.len()
            );
            return first;
        }

        log_ai_operation!(warn, "summarize", "suspicious response, retrying with extraction prompt");
        debug!(response = %first, "Suspicious summary response");

        let retry_prompt = build_retry_summary_prompt(&input);
        match self.backend.generate(&retry_prompt).await {
            Ok(retry) if !is_suspicious_summary(&retry) => {
                log_ai_operation!(
                    success,
                    "summarize",
                    backend = self.backend.name(),
                    response_length = retry.len()
                );
                retry
            }
            Ok(_) => {
                log_ai_operation!(warn, "summarize", "retry still suspicious, using simulated summary");
                self.fallback.render(&prompt)
            }
            Err(e) => {
                log_ai_operation!(error, "summarize", backend = self.backend.name(), error = e);
                self.fallback.render(&prompt)
            }
        }
    }

    /// Streaming summarize: each chunk is forwarded into `tx` as it arrives.
    /// If the primary backend fails mid-stream the simulated backend resumes
    /// on the same channel. Returns the full accumulated text so the caller
    /// can persist it.
    pub async fn summarize_stream(&self, document_text: &str, tx: mpsc::Sender<String>) -> String {
        let input = truncate_input(document_text, SUMMARY_INPUT_LIMIT);
        let prompt = build_summary_prompt(&input);
        log_ai_operation!(start, "summarize_stream", backend = self.backend.name());

        let (inner_tx, mut inner_rx) = mpsc::channel::<String>(16);
        let backend = self.backend.clone();
        let stream_prompt = prompt.clone();
        let producer =
            tokio::spawn(async move { backend.generate_stream(&stream_prompt, inner_tx).await });

        let mut accumulated = String::new();
        while let Some(chunk) = inner_rx.recv().await {
            accumulated.push_str(&chunk);
            if tx.send(chunk).await.is_err() {
                // Client went away; keep draining so the full summary can
                // still be persisted.
                continue;
            }
        }

        let stream_result = match producer.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("streaming task panicked: {}", e)),
        };

        if let Err(e) = stream_result {
            warn!(
                backend = self.backend.name(),
                error = %e,
                "Primary backend failed mid-stream, resuming with simulated backend"
            );
            self.fallback.stream_render(&prompt, tx).await;
            accumulated.push_str(&self.fallback.render(&prompt));
        }

        log_ai_operation!(
            success,
            "summarize_stream",
            backend = self.backend.name(),
            response_length = accumulated.len()
        );
        accumulated
    }

    /// Generate quiz questions. Unlike the other operations this re-raises
    /// when nothing valid could be produced; the caller must mark the owning
    /// quiz failed.
    pub async fn generate_quiz(
        &self,
        document_text: &str,
        question_count: usize,
    ) -> ApiResult<Vec<ParsedQuestion>> {
        let input = truncate_input(document_text, QUIZ_INPUT_LIMIT);
        let prompt = build_quiz_prompt(&input, question_count);
        log_ai_operation!(start, "generate_quiz", backend = self.backend.name());

        let raw = match self.backend.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                log_ai_operation!(error, "generate_quiz", backend = self.backend.name(), error = e);
                self.fallback.render(&prompt)
            }
        };
        debug!(response_length = raw.len(), "Raw quiz generation response");

        let questions = response_parser::parse_quiz_response(&raw);
        if questions.is_empty() {
            error!(
                backend = self.backend.name(),
                response_length = raw.len(),
                "No valid questions extracted from quiz response"
            );
            return Err(ApiError::QuizGeneration(
                "no valid questions could be extracted from the backend response".to_string(),
            ));
        }

        log_ai_operation!(
            success,
            "generate_quiz",
            backend = self.backend.name(),
            response_length = raw.len()
        );
        Ok(questions)
    }

    /// Summarize a video by URL. The URL is validated and the platform id
    /// derived before any network call; parsing itself never hard-fails.
    pub async fn summarize_video(&self, url: &str) -> ApiResult<(String, VideoSummaryContent)> {
        let video_id = extract_video_id(url).ok_or_else(|| {
            ApiError::ValidationError(format!("'{}' is not a recognized YouTube URL", url))
        })?;

        let prompt = build_video_prompt(url, &video_id);
        log_ai_operation!(start, "summarize_video", backend = self.backend.name());

        let raw = match self.backend.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                log_ai_operation!(error, "summarize_video", backend = self.backend.name(), error = e);
                self.fallback.render(&prompt)
            }
        };
        debug!(response_length = raw.len(), "Raw video summary response");

        Ok((video_id, response_parser::parse_video_response(&raw)))
    }

    /// Generate remediation content for a set of missed questions. Parsing
    /// follows the same tiered discipline as the other operations and the
    /// passthrough tier means this cannot fail outright.
    pub async fn generate_learning_resources(
        &self,
        document_text: &str,
        incorrect: &[IncorrectAnswer],
    ) -> GeneratedPlan {
        let input = truncate_input(document_text, QUIZ_INPUT_LIMIT);
        let prompt = build_plan_prompt(&input, incorrect);
        log_ai_operation!(start, "generate_learning_resources", backend = self.backend.name());

        let raw = match self.backend.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                log_ai_operation!(
                    error,
                    "generate_learning_resources",
                    backend = self.backend.name(),
                    error = e
                );
                self.fallback.render(&prompt)
            }
        };
        debug!(response_length = raw.len(), "Raw learning resources response");

        response_parser::parse_plan_response(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id_known_shapes() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=x&v=dQw4w9WgXcQ&t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_extract_video_id_rejects_other_urls() {
        assert_eq!(extract_video_id("https://vimeo.com/123456"), None);
        assert_eq!(extract_video_id("https://example.com/watch?v=dQw4w9WgXcQ"), None);
        assert_eq!(extract_video_id("not a url"), None);
        // Truncated id
        assert_eq!(extract_video_id("https://youtu.be/short"), None);
    }

    #[test]
    fn test_truncate_input_appends_marker_only_when_cut() {
        let short = "short document";
        assert_eq!(truncate_input(short, 100), short);

        let long = "x".repeat(150);
        let truncated = truncate_input(&long, 100);
        assert!(truncated.starts_with(&"x".repeat(100)));
        assert!(truncated.ends_with("[content truncated]"));
        assert!(!truncate_input(&long, 150).contains("[content truncated]"));
    }

    #[test]
    fn test_suspicious_summary_detection() {
        assert!(is_suspicious_summary("Too short."));
        let refusal = format!(
            "I'm sorry, but I cannot summarize this document for you. {}",
            "padding ".repeat(40)
        );
        assert!(is_suspicious_summary(&refusal));
        let fine = "The document explains the borrow checker. ".repeat(10);
        assert!(!is_suspicious_summary(&fine));
    }
}
