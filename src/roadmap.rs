//! Mindmap roadmap post-processing and fallback synthesis.
//!
//! Roadmaps are diagram source text rendered client-side: a `mindmap` header,
//! a `root((Title))` line at two spaces, topics at four and subtopics at six.
//! Backends sometimes return the whole diagram flattened onto one line; this
//! module reconstructs the indentation from a fixed subtopic vocabulary, and
//! when that fails synthesizes a generic roadmap from the questions the user
//! got wrong.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::IncorrectAnswer;

static ROOT_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"root\(\((.+?)\)\)").expect("valid regex"));

const ROOT_TITLE: &str = "Study Plan";

const CLOSING_TOPIC: &str = "Master Subject";
const CLOSING_SUBTOPICS: [&str; 2] = ["Final Assessment", "Ongoing Practice"];

/// Keyword-matched subtopic tables: the first table whose keyword appears in
/// the lowercased topic label wins.
const SUBTOPIC_TABLES: [(&[&str], [&str; 3]); 3] = [
    (
        &["basic", "concept", "fundamental", "introduction", "definition", "overview"],
        ["Introduction", "Key Terminology", "Fundamental Principles"],
    ),
    (
        &["process", "method", "how", "step", "work"],
        ["Process Overview", "Step-by-Step Breakdown", "Common Pitfalls"],
    ),
    (
        &["compare", "difference", "versus", "contrast"],
        ["Similarities", "Key Differences", "When To Use Each"],
    ),
];

const DEFAULT_SUBTOPICS: [&str; 3] = ["Core Concepts", "Worked Examples", "Practice Exercises"];

const MAX_FALLBACK_TOPICS: usize = 3;
const TOPIC_LABEL_WORDS: usize = 4;

/// Normalize a backend-supplied roadmap. Multi-line text passes through
/// unchanged; a flattened single-line mindmap is re-indented; anything
/// unrecognizable yields `None` so the caller can synthesize a fallback.
pub fn normalize_roadmap(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    if raw.contains('\n') {
        return Some(raw.to_string());
    }
    reconstruct_flat_mindmap(raw)
}

/// Post-process the gateway's roadmap, falling back to a synthesized mindmap
/// whenever nothing renderable came back.
pub fn build_roadmap(ai_roadmap: Option<&str>, incorrect: &[IncorrectAnswer]) -> String {
    ai_roadmap
        .and_then(normalize_roadmap)
        .unwrap_or_else(|| fallback_mindmap(incorrect))
}

/// Rebuild indentation for a one-line mindmap: bare words after the
/// `root((...))` marker are topics, and runs matching the known subtopic
/// vocabulary are nested beneath the topic that precedes them. Returns `None`
/// unless at least one topic with one recognized subtopic comes out — a
/// flat line whose vocabulary is entirely unknown is not a structure this
/// heuristic understands, and the caller synthesizes a fallback instead.
fn reconstruct_flat_mindmap(line: &str) -> Option<String> {
    let root = ROOT_NODE.captures(line)?;
    let title = root.get(1)?.as_str().trim();
    let rest = &line[root.get(0)?.end()..];

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let vocabulary = subtopic_vocabulary();

    let mut lines = vec!["mindmap".to_string(), format!("  root(({}))", title)];
    let mut topic_buffer: Vec<&str> = Vec::new();
    let mut topic_count = 0usize;
    let mut subtopic_count = 0usize;
    let mut index = 0usize;

    while index < tokens.len() {
        if phrase_at(&tokens, index, CLOSING_TOPIC) {
            flush_topic(&mut lines, &mut topic_buffer, &mut topic_count);
            lines.push(format!("    {}", CLOSING_TOPIC));
            topic_count += 1;
            index += phrase_len(CLOSING_TOPIC);
            continue;
        }

        if let Some(phrase) = vocabulary.iter().find(|phrase| phrase_at(&tokens, index, phrase)) {
            flush_topic(&mut lines, &mut topic_buffer, &mut topic_count);
            if topic_count == 0 {
                // Subtopic with no owning topic.
                return None;
            }
            lines.push(format!("      {}", phrase));
            subtopic_count += 1;
            index += phrase_len(phrase);
            continue;
        }

        topic_buffer.push(tokens[index]);
        index += 1;
    }
    flush_topic(&mut lines, &mut topic_buffer, &mut topic_count);

    (topic_count > 0 && subtopic_count > 0).then(|| lines.join("\n"))
}

fn flush_topic(lines: &mut Vec<String>, buffer: &mut Vec<&str>, topic_count: &mut usize) {
    if !buffer.is_empty() {
        lines.push(format!("    {}", buffer.join(" ")));
        *topic_count += 1;
        buffer.clear();
    }
}

fn phrase_len(phrase: &str) -> usize {
    phrase.split_whitespace().count()
}

fn phrase_at(tokens: &[&str], index: usize, phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    tokens.len() >= index + words.len()
        && words
            .iter()
            .zip(&tokens[index..])
            .all(|(expected, actual)| expected.eq_ignore_ascii_case(actual))
}

/// Every subtopic phrase the reconstruction heuristic recognizes, longest
/// phrases first so multi-word phrases win over their prefixes.
fn subtopic_vocabulary() -> Vec<&'static str> {
    let mut phrases: Vec<&'static str> = SUBTOPIC_TABLES
        .iter()
        .flat_map(|(_, subtopics)| subtopics.iter().copied())
        .chain(DEFAULT_SUBTOPICS.iter().copied())
        .chain(CLOSING_SUBTOPICS.iter().copied())
        .collect();
    phrases.sort_by_key(|phrase| std::cmp::Reverse(phrase_len(phrase)));
    phrases.dedup();
    phrases
}

/// Synthesize a generic roadmap from the incorrect questions: up to three
/// deduplicated topic labels taken from the question stems, three
/// keyword-matched subtopics each, and a closing "Master Subject" branch
/// with exactly two leaves. Always yields at least one topic branch.
pub fn fallback_mindmap(incorrect: &[IncorrectAnswer]) -> String {
    let mut topics: Vec<String> = Vec::new();
    for answer in incorrect {
        let label = topic_label(&answer.question);
        if label.is_empty() {
            continue;
        }
        if !topics.iter().any(|existing| existing.eq_ignore_ascii_case(&label)) {
            topics.push(label);
        }
        if topics.len() == MAX_FALLBACK_TOPICS {
            break;
        }
    }
    if topics.is_empty() {
        topics.push("General Review".to_string());
    }

    let mut lines = vec!["mindmap".to_string(), format!("  root(({}))", ROOT_TITLE)];
    for topic in &topics {
        lines.push(format!("    {}", topic));
        for subtopic in subtopics_for(topic) {
            lines.push(format!("      {}", subtopic));
        }
    }
    lines.push(format!("    {}", CLOSING_TOPIC));
    for subtopic in CLOSING_SUBTOPICS {
        lines.push(format!("      {}", subtopic));
    }

    lines.join("\n")
}

/// First few words of the question stem, stripped of punctuation.
fn topic_label(question: &str) -> String {
    question
        .split_whitespace()
        .take(TOPIC_LABEL_WORDS)
        .map(|word| word.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn subtopics_for(topic: &str) -> [&'static str; 3] {
    let lowered = topic.to_lowercase();
    SUBTOPIC_TABLES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, subtopics)| *subtopics)
        .unwrap_or(DEFAULT_SUBTOPICS)
}
