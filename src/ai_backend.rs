//! Generative-text backends behind a single strategy seam.
//!
//! `TextBackend` is either the real Gemini HTTP integration or a
//! deterministic offline simulator. Selection happens once at startup from
//! configuration; the gateway additionally keeps a simulator around as the
//! runtime degradation target.

use anyhow::Result;
use futures_util::StreamExt;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::AiConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Clone)]
pub enum TextBackend {
    Gemini(GeminiBackend),
    Simulated(SimulatedBackend),
}

impl TextBackend {
    /// Explicit startup selection: a real API key selects the live backend,
    /// anything else the simulator.
    pub fn from_config(config: &AiConfig) -> Self {
        if config.is_live() {
            let backend = GeminiBackend::new(
                config.api_key.clone(),
                config.base_url.clone(),
                config.model.clone(),
            );
            info!(backend = "gemini", model = %backend.model_name(), "AI backend selected");
            TextBackend::Gemini(backend)
        } else {
            info!(backend = "simulated", "AI backend selected (no API key configured)");
            TextBackend::Simulated(SimulatedBackend::new())
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextBackend::Gemini(_) => "gemini",
            TextBackend::Simulated(_) => "simulated",
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            TextBackend::Gemini(backend) => backend.model_name(),
            TextBackend::Simulated(_) => "simulated",
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            TextBackend::Gemini(backend) => backend.generate(prompt).await,
            TextBackend::Simulated(backend) => Ok(backend.render(prompt)),
        }
    }

    /// Stream the response chunk by chunk into `tx`. A closed receiver ends
    /// the stream silently; transport errors are returned so the caller can
    /// resume on the fallback backend.
    pub async fn generate_stream(&self, prompt: &str, tx: mpsc::Sender<String>) -> Result<()> {
        match self {
            TextBackend::Gemini(backend) => backend.generate_stream(prompt, tx).await,
            TextBackend::Simulated(backend) => {
                backend.stream_render(prompt, tx).await;
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Gemini wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: i32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: i32,
}

impl Default for GeminiGenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 8192,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

/// Live integration with the generative-text HTTP API.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig::default(),
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        info!(
            backend = "gemini",
            model = %self.model,
            prompt_length = prompt.len(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                backend = "gemini",
                status = %status,
                error = %error_text,
                "Generation request failed"
            );
            return Err(anyhow::anyhow!("Gemini API request failed: {}", status));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let text = gemini_response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.clone())
            .ok_or_else(|| anyhow::anyhow!("No candidate text in Gemini response"))?;

        info!(
            backend = "gemini",
            response_length = text.len(),
            "Generation request completed"
        );

        Ok(text)
    }

    /// Server-sent-events streaming variant. Each `data:` event carries one
    /// incremental response chunk.
    pub async fn generate_stream(&self, prompt: &str, tx: mpsc::Sender<String>) -> Result<()> {
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig::default(),
        };

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow::anyhow!("Gemini streaming request failed: {}", status));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk_result) = stream.next().await {
            let bytes = chunk_result?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // Process complete SSE events
            while let Some(pos) = buffer.find("\n\n") {
                let event = buffer[..pos].to_string();
                buffer = buffer[pos + 2..].to_string();

                if let Some(text) = parse_sse_event(&event) {
                    if tx.send(text).await.is_err() {
                        return Ok(()); // Receiver dropped
                    }
                }
            }
        }

        if let Some(text) = parse_sse_event(&buffer) {
            let _ = tx.send(text).await;
        }

        Ok(())
    }
}

fn parse_sse_event(event: &str) -> Option<String> {
    for line in event.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            continue;
        }
        if let Ok(response) = serde_json::from_str::<GeminiResponse>(data) {
            if let Some(text) = response
                .candidates
                .first()
                .and_then(|candidate| candidate.content.parts.first())
                .map(|part| part.text.clone())
            {
                return Some(text);
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Simulated backend
// ---------------------------------------------------------------------------

static REQUESTED_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)exactly (\d+)").expect("valid regex"));

static EMBEDDED_DOCUMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Document:\s*\n(.*)").expect("valid regex"));

const SIMULATED_QUIZ_DEFAULT_COUNT: usize = 5;
const STREAM_CHUNK_WORDS: usize = 8;

/// Deterministic offline backend: templated output keyed on the request kind
/// recognizable from the prompt. The same prompt always renders the same
/// text, which keeps every downstream parser and test exercisable without a
/// network.
#[derive(Clone, Default)]
pub struct SimulatedBackend;

impl SimulatedBackend {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, prompt: &str) -> String {
        if prompt.contains("option_a") {
            self.render_quiz(prompt)
        } else if prompt.contains("actionable_takeaways") {
            self.render_video()
        } else if prompt.contains("\"roadmap\"") {
            self.render_plan()
        } else {
            self.render_summary(prompt)
        }
    }

    /// Chunked variant of `render`; a closed receiver simply ends the stream.
    pub async fn stream_render(&self, prompt: &str, tx: mpsc::Sender<String>) {
        let text = self.render(prompt);
        let words: Vec<&str> = text.split_inclusive(char::is_whitespace).collect();
        for chunk in words.chunks(STREAM_CHUNK_WORDS) {
            if tx.send(chunk.concat()).await.is_err() {
                return;
            }
        }
    }

    fn render_summary(&self, prompt: &str) -> String {
        let excerpt = EMBEDDED_DOCUMENT
            .captures(prompt)
            .and_then(|capture| capture.get(1))
            .map(|m| m.as_str().trim())
            .unwrap_or("")
            .chars()
            .take(160)
            .collect::<String>();

        format!(
            "This document presents its subject in a structured progression, opening with \
             the core definitions a reader needs and building toward the applied material \
             in its later sections. The central argument is developed through worked \
             examples, and the closing passages consolidate the key conclusions a student \
             should retain for review.\n\nOpening excerpt: {}",
            excerpt
        )
    }

    fn render_quiz(&self, prompt: &str) -> String {
        let count = REQUESTED_COUNT
            .captures(prompt)
            .and_then(|capture| capture.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .unwrap_or(SIMULATED_QUIZ_DEFAULT_COUNT);

        let letters = ["a", "b", "c", "d"];
        let questions: Vec<serde_json::Value> = (1..=count)
            .map(|i| {
                let correct = letters[(i - 1) % letters.len()];
                let mut options = serde_json::Map::new();
                for letter in letters {
                    let text = if letter == correct {
                        format!("The reading the source material actually develops (point {})", i)
                    } else {
                        format!("A plausible but unsupported reading ({}{})", letter, i)
                    };
                    options.insert(format!("option_{}", letter), serde_json::Value::String(text));
                }
                let mut question = serde_json::Map::new();
                question.insert(
                    "question".to_string(),
                    serde_json::Value::String(format!(
                        "Which statement best captures key idea {} of the source material?",
                        i
                    )),
                );
                question.extend(options);
                question.insert(
                    "correct_answer".to_string(),
                    serde_json::Value::String(correct.to_string()),
                );
                serde_json::Value::Object(question)
            })
            .collect();

        serde_json::Value::Array(questions).to_string()
    }

    fn render_video(&self) -> String {
        serde_json::json!({
            "summary": "The video walks through its topic end to end, framing the problem, \
                        demonstrating the main technique on screen, and closing with advice \
                        on avoiding the most common mistakes.",
            "key_points": [
                "The problem is framed before any solution is shown",
                "The main technique is demonstrated step by step",
                "Common mistakes are called out near the end"
            ],
            "actionable_takeaways": [
                "Reproduce the demonstrated technique on a small example",
                "Review the listed mistakes before applying it to real work",
                "Summarize the video in your own words to test recall"
            ]
        })
        .to_string()
    }

    fn render_plan(&self) -> String {
        serde_json::json!({
            "summary": "Your results point to a few specific gaps rather than a general \
                        misunderstanding. Revisit the topics below in order, starting with \
                        the fundamentals each missed question depends on, then confirm the \
                        material with the linked resources.",
            "roadmap": "mindmap\n  root((Study Plan))\n    Targeted Review\n      Core Concepts\n      Worked Examples\n      Practice Exercises\n    Master Subject\n      Final Assessment\n      Ongoing Practice",
            "topics": [
                {
                    "topic": "Targeted Review",
                    "description": "Revisit the sections behind the questions answered incorrectly.",
                    "priority": 1,
                    "resources": [
                        {
                            "description": "Re-read the relevant chapter and take margin notes",
                            "url": null,
                            "type": "reading"
                        },
                        {
                            "description": "Attempt the chapter's practice problems unaided",
                            "url": null,
                            "type": "exercise"
                        }
                    ]
                },
                {
                    "topic": "Consolidation",
                    "description": "Lock the corrected understanding in with spaced review.",
                    "priority": 2,
                    "resources": [
                        {
                            "description": "Schedule a short self-quiz in two days",
                            "url": null,
                            "type": "exercise"
                        }
                    ]
                }
            ]
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_backend_is_deterministic() {
        let backend = SimulatedBackend::new();
        let prompt = "Summarize the following.\n\nDocument:\nRust is a systems language.";
        assert_eq!(backend.render(prompt), backend.render(prompt));
    }

    #[test]
    fn test_simulated_quiz_honors_requested_count() {
        let backend = SimulatedBackend::new();
        let prompt = "Generate exactly 3 multiple-choice questions. Use keys option_a..option_d.";
        let rendered = backend.render(prompt);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_simulated_summary_is_not_suspiciously_short() {
        let backend = SimulatedBackend::new();
        let rendered = backend.render("Summarize this.\n\nDocument:\nShort text.");
        assert!(rendered.len() >= 200);
    }

    #[test]
    fn test_sse_event_parsing() {
        let event = r#"data: {"candidates":[{"content":{"parts":[{"text":"Hello"}]}}]}"#;
        assert_eq!(parse_sse_event(event), Some("Hello".to_string()));
        assert_eq!(parse_sse_event("data: [DONE]"), None);
        assert_eq!(parse_sse_event(": keep-alive"), None);
    }
}
