//! Tiered extraction of structured records from free-form model output.
//!
//! The backend's output format is not contractually guaranteed, so every
//! parser degrades through independent tiers composed with first-success
//! semantics: strict JSON extraction, then heuristic pattern extraction,
//! then (where a hard failure is unacceptable) raw passthrough. Each tier is
//! a pure function returning `Option`; nothing in this module logs or
//! performs IO — callers own observability.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::models::{AnswerOption, GeneratedPlan, ParsedQuestion, PlanResource, PlanTopic, VideoSummaryContent};

static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").expect("valid regex"));

static JSON_OBJECT_WITH_SUMMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)\{\s*"summary".*\}"#).expect("valid regex"));

static QUESTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bquestion\s*\d*\s*[:.)]").expect("valid regex"));

static OPTION_MARKERS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    ["a", "b", "c", "d"].map(|letter| {
        Regex::new(&format!(r"(?i)\b{letter}[).:]\s*")).expect("valid regex")
    })
});

static ANSWER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:correct\s+answer|answer)\s*(?:is)?\s*[:\-]?\s*\(?([a-d])\b")
        .expect("valid regex")
});

static STEM_TERMINATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)options\s*:|\ba[).]").expect("valid regex"));

static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:\*\*|#+\s*)?(summary|key\s*points|actionable\s*takeaways)\b\s*(?:\*\*)?\s*:?(?:\*\*)?")
        .expect("valid regex")
});

static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:[-*•]|\d+[.)])\s+(.+)$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Quiz questions
// ---------------------------------------------------------------------------

/// Extract every valid quiz question from a model response, in order.
/// Returns an empty vector when no tier yields anything; the caller decides
/// whether that is fatal.
pub fn parse_quiz_response(text: &str) -> Vec<ParsedQuestion> {
    quiz_from_json(text)
        .or_else(|| quiz_from_blocks(text))
        .unwrap_or_default()
}

/// Tier 1: the first JSON-array-shaped substring, if it parses, decides the
/// result — its valid elements are returned and its invalid elements are
/// dropped without falling through to the heuristic tier.
fn quiz_from_json(text: &str) -> Option<Vec<ParsedQuestion>> {
    let candidate = JSON_ARRAY.find(text)?;
    let parsed: Value = serde_json::from_str(candidate.as_str()).ok()?;
    let elements = parsed.as_array()?;
    Some(elements.iter().filter_map(validate_question).collect())
}

/// A question record is valid when all six fields are present, the text
/// fields are non-empty, and the answer letter normalizes to a-d.
fn validate_question(value: &Value) -> Option<ParsedQuestion> {
    let field = |key: &str| -> Option<String> {
        let text = value.get(key)?.as_str()?.trim().to_string();
        (!text.is_empty()).then_some(text)
    };

    Some(ParsedQuestion {
        question: field("question")?,
        option_a: field("option_a")?,
        option_b: field("option_b")?,
        option_c: field("option_c")?,
        option_d: field("option_d")?,
        correct_answer: AnswerOption::parse(value.get("correct_answer")?.as_str()?)?,
    })
}

/// Tier 2: split the response on numbered "Question:" markers and mine each
/// block for a stem, four options, and an answer letter. Blocks that do not
/// yield all of those are omitted, not errors.
fn quiz_from_blocks(text: &str) -> Option<Vec<ParsedQuestion>> {
    let marker_ends: Vec<usize> = QUESTION_MARKER.find_iter(text).map(|m| m.end()).collect();
    if marker_ends.is_empty() {
        return None;
    }

    let marker_starts: Vec<usize> = QUESTION_MARKER.find_iter(text).map(|m| m.start()).collect();
    let mut questions = Vec::new();
    for (i, &start) in marker_ends.iter().enumerate() {
        let end = marker_starts.get(i + 1).copied().unwrap_or(text.len());
        if let Some(question) = question_from_block(&text[start..end]) {
            questions.push(question);
        }
    }

    (!questions.is_empty()).then_some(questions)
}

fn question_from_block(block: &str) -> Option<ParsedQuestion> {
    let stem = question_stem(block);
    if stem.is_empty() {
        return None;
    }

    // Locate the four option markers in order; a missing letter discards the
    // block. Each option's text runs from its marker to the next boundary.
    let mut cursor = 0usize;
    let mut spans = Vec::with_capacity(4);
    for marker in OPTION_MARKERS.iter() {
        let found = marker.find(&block[cursor..])?;
        spans.push((cursor + found.start(), cursor + found.end()));
        cursor = cursor + found.end();
    }

    let answer_capture = ANSWER_MARKER.captures(&block[cursor..])?;
    let answer = AnswerOption::parse(answer_capture.get(1)?.as_str())?;
    let answer_start = cursor + answer_capture.get(0)?.start();

    let mut options = Vec::with_capacity(4);
    for (i, &(_, text_start)) in spans.iter().enumerate() {
        let text_end = spans
            .get(i + 1)
            .map(|&(next_start, _)| next_start)
            .unwrap_or(answer_start);
        let option = block[text_start..text_end].trim().to_string();
        if option.is_empty() {
            return None;
        }
        options.push(option);
    }

    let mut options = options.into_iter();
    Some(ParsedQuestion {
        question: stem,
        option_a: options.next()?,
        option_b: options.next()?,
        option_c: options.next()?,
        option_d: options.next()?,
        correct_answer: answer,
    })
}

/// The stem runs to the first newline or the first "Options:"/"A)" marker,
/// whichever comes first.
fn question_stem(block: &str) -> String {
    let mut end = block.len();
    if let Some(newline) = block.find('\n') {
        end = end.min(newline);
    }
    if let Some(terminator) = STEM_TERMINATOR.find(block) {
        end = end.min(terminator.start());
    }
    block[..end].trim().to_string()
}

// ---------------------------------------------------------------------------
// Video summaries
// ---------------------------------------------------------------------------

/// Extract a video summary record. Never fails: the last tier returns the
/// whole raw response as the summary with empty lists.
pub fn parse_video_response(text: &str) -> VideoSummaryContent {
    video_from_json(text)
        .or_else(|| video_from_sections(text))
        .unwrap_or_else(|| VideoSummaryContent {
            summary: text.trim().to_string(),
            key_points: Vec::new(),
            actionable_takeaways: Vec::new(),
        })
}

/// Tier 1: a JSON-object-shaped substring starting with `{"summary"`. All
/// three keys must be present for the tier to succeed.
fn video_from_json(text: &str) -> Option<VideoSummaryContent> {
    let candidate = JSON_OBJECT_WITH_SUMMARY.find(text)?;
    let parsed: Value = serde_json::from_str(candidate.as_str()).ok()?;

    let summary = parsed.get("summary")?.as_str()?.trim().to_string();
    let key_points = string_list(parsed.get("key_points")?)?;
    let actionable_takeaways = string_list(parsed.get("actionable_takeaways")?)?;

    Some(VideoSummaryContent {
        summary,
        key_points,
        actionable_takeaways,
    })
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
    )
}

/// Tier 2: "Summary:" / "Key Points:" / "Actionable Takeaways:" section
/// blocks, with bullet-style items split out of the list sections.
fn video_from_sections(text: &str) -> Option<VideoSummaryContent> {
    let sections = split_sections(text);
    if sections.is_empty() {
        return None;
    }

    let mut content = VideoSummaryContent {
        summary: String::new(),
        key_points: Vec::new(),
        actionable_takeaways: Vec::new(),
    };

    for (header, body) in &sections {
        match header.as_str() {
            "summary" => content.summary = body.trim().to_string(),
            "key points" => content.key_points = bullet_items(body),
            "actionable takeaways" => content.actionable_takeaways = bullet_items(body),
            _ => {}
        }
    }

    let empty = content.summary.is_empty()
        && content.key_points.is_empty()
        && content.actionable_takeaways.is_empty();
    (!empty).then_some(content)
}

/// Header name (whitespace-normalized, lowercase) and the text up to the
/// next header.
fn split_sections(text: &str) -> Vec<(String, String)> {
    let matches: Vec<_> = SECTION_HEADER.captures_iter(text).collect();
    let mut sections = Vec::with_capacity(matches.len());
    for (i, capture) in matches.iter().enumerate() {
        let whole = capture.get(0).map(|m| m.end()).unwrap_or(0);
        let name = capture
            .get(1)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        let end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        sections.push((name, text[whole..end].to_string()));
    }
    sections
}

fn bullet_items(body: &str) -> Vec<String> {
    BULLET_ITEM
        .captures_iter(body)
        .filter_map(|capture| capture.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Learning plans
// ---------------------------------------------------------------------------

/// Extract the remediation payload: prose summary, optional roadmap text, and
/// a topics/resources tree. Never fails; the passthrough tier keeps the raw
/// response as the summary. A present-but-malformed topics container yields
/// an empty topic list — the caller logs and continues.
pub fn parse_plan_response(text: &str) -> GeneratedPlan {
    plan_from_json(text)
        .or_else(|| plan_from_sections(text))
        .unwrap_or_else(|| GeneratedPlan {
            summary: text.trim().to_string(),
            roadmap: None,
            topics: Vec::new(),
        })
}

fn plan_from_json(text: &str) -> Option<GeneratedPlan> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let parsed: Value = serde_json::from_str(&text[start..=end]).ok()?;

    let summary = parsed
        .get("summary")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let roadmap = parsed
        .get("roadmap")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let topics: Vec<PlanTopic> = parsed
        .get("topics")
        .and_then(|v| v.as_array())
        .map(|entries| entries.iter().filter_map(validate_topic).collect())
        .unwrap_or_default();

    let empty = summary.is_empty() && roadmap.is_none() && topics.is_empty();
    (!empty).then_some(GeneratedPlan {
        summary,
        roadmap,
        topics,
    })
}

fn validate_topic(value: &Value) -> Option<PlanTopic> {
    let topic = value.get("topic")?.as_str()?.trim().to_string();
    if topic.is_empty() {
        return None;
    }

    let description = value
        .get("description")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let priority = value.get("priority").and_then(|v| v.as_i64());
    let resources = value
        .get("resources")
        .and_then(|v| v.as_array())
        .map(|entries| entries.iter().filter_map(validate_resource).collect())
        .unwrap_or_default();

    Some(PlanTopic {
        topic,
        description,
        priority,
        resources,
    })
}

fn validate_resource(value: &Value) -> Option<PlanResource> {
    let description = value.get("description")?.as_str()?.trim().to_string();
    if description.is_empty() {
        return None;
    }

    let text_field = |key: &str| -> Option<String> {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    Some(PlanResource {
        description,
        url: text_field("url"),
        resource_type: text_field("type"),
    })
}

/// Tier 2 for plans: a "Summary:" section plus any mindmap block present in
/// the prose. Topics cannot be recovered heuristically and stay empty.
fn plan_from_sections(text: &str) -> Option<GeneratedPlan> {
    let sections = split_sections(text);
    let summary = sections
        .iter()
        .find(|(header, _)| header == "summary")
        .map(|(_, body)| body.trim().to_string())
        .unwrap_or_default();

    let roadmap = text
        .find("root((")
        .map(|at| {
            let block_start = text[..at].rfind("mindmap").unwrap_or(at);
            text[block_start..].trim().to_string()
        })
        .filter(|block| !block.is_empty());

    if summary.is_empty() && roadmap.is_none() {
        return None;
    }

    Some(GeneratedPlan {
        summary,
        roadmap,
        topics: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_tier_normalizes_answer_case() {
        let response = r#"[{"question":"Q1?","option_a":"A","option_b":"B","option_c":"C","option_d":"D","correct_answer":"B"}]"#;
        let questions = parse_quiz_response(response);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer, AnswerOption::B);
    }

    #[test]
    fn test_json_tier_drops_invalid_entries_preserving_order() {
        let response = r#"Here you go:
[
  {"question":"First?","option_a":"1","option_b":"2","option_c":"3","option_d":"4","correct_answer":"a"},
  {"question":"Broken","option_a":"1","option_b":"2","correct_answer":"a"},
  {"question":"Bad letter","option_a":"1","option_b":"2","option_c":"3","option_d":"4","correct_answer":"e"},
  {"question":"Last?","option_a":"1","option_b":"2","option_c":"3","option_d":"4","correct_answer":"D"}
]"#;
        let questions = parse_quiz_response(response);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "First?");
        assert_eq!(questions[1].question, "Last?");
        assert_eq!(questions[1].correct_answer, AnswerOption::D);
    }

    #[test]
    fn test_block_tier_extracts_options_and_answer() {
        let response = "Question 1: What is the capital of France?\n\
                        a) Berlin\n\
                        b) Paris\n\
                        c) Madrid\n\
                        d) Rome\n\
                        Correct Answer: b\n\n\
                        Question 2: Which planet is largest?\n\
                        A) Mars\n\
                        B) Venus\n\
                        C) Jupiter\n\
                        D) Mercury\n\
                        Answer: C";
        let questions = parse_quiz_response(response);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "What is the capital of France?");
        assert_eq!(questions[0].option_b, "Paris");
        assert_eq!(questions[0].correct_answer, AnswerOption::B);
        assert_eq!(questions[1].option_c, "Jupiter");
        assert_eq!(questions[1].correct_answer, AnswerOption::C);
    }

    #[test]
    fn test_block_missing_an_option_is_discarded() {
        let response = "Question 1: Complete one?\n\
                        a) Yes\n\
                        b) No\n\
                        c) Maybe\n\
                        d) Unsure\n\
                        Answer: a\n\
                        Question 2: Missing option d?\n\
                        a) One\n\
                        b) Two\n\
                        c) Three\n\
                        Answer: b";
        let questions = parse_quiz_response(response);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Complete one?");
    }

    #[test]
    fn test_unstructured_response_yields_empty_list() {
        let questions = parse_quiz_response("I'm sorry, I can't help with that request.");
        assert!(questions.is_empty());
    }

    #[test]
    fn test_video_json_tier() {
        let response = r#"```json
{"summary": "A video about Rust.", "key_points": ["Ownership", "Borrowing"], "actionable_takeaways": ["Read the book"]}
```"#;
        let content = parse_video_response(response);
        assert_eq!(content.summary, "A video about Rust.");
        assert_eq!(content.key_points, vec!["Ownership", "Borrowing"]);
        assert_eq!(content.actionable_takeaways, vec!["Read the book"]);
    }

    #[test]
    fn test_video_section_tier() {
        let response = "Summary:\nA walkthrough of async Rust.\n\n\
                        Key Points:\n- Futures are lazy\n* Executors drive them\n1. Pinning matters\n\n\
                        Actionable Takeaways:\n- Try tokio\n- Profile your tasks";
        let content = parse_video_response(response);
        assert_eq!(content.summary, "A walkthrough of async Rust.");
        assert_eq!(
            content.key_points,
            vec!["Futures are lazy", "Executors drive them", "Pinning matters"]
        );
        assert_eq!(content.actionable_takeaways.len(), 2);
    }

    #[test]
    fn test_video_passthrough_tier_never_fails() {
        let raw = "Just some plain prose with no structure at all.";
        let content = parse_video_response(raw);
        assert_eq!(content.summary, raw);
        assert!(content.key_points.is_empty());
        assert!(content.actionable_takeaways.is_empty());
    }

    #[test]
    fn test_plan_json_tier_with_malformed_topics_container() {
        let response = r#"{"summary": "Focus on the basics.", "roadmap": "mindmap\n  root((Study Plan))", "topics": "oops-not-an-array"}"#;
        let plan = parse_plan_response(response);
        assert_eq!(plan.summary, "Focus on the basics.");
        assert!(plan.roadmap.is_some());
        assert!(plan.topics.is_empty());
    }

    #[test]
    fn test_plan_passthrough_keeps_raw_summary() {
        let raw = "You should revisit chapter two.";
        let plan = parse_plan_response(raw);
        assert_eq!(plan.summary, raw);
        assert!(plan.roadmap.is_none());
        assert!(plan.topics.is_empty());
    }
}
