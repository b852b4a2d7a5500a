use studypath::models::AnswerOption;
use studypath::response_parser::{parse_plan_response, parse_quiz_response, parse_video_response};

// Quiz parsing: strict JSON tier

#[test]
fn test_single_question_array_normalizes_answer() {
    let response = r#"[{"question":"Q1?","option_a":"A","option_b":"B","option_c":"C","option_d":"D","correct_answer":"B"}]"#;
    let questions = parse_quiz_response(response);

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].question, "Q1?");
    assert_eq!(questions[0].correct_answer, AnswerOption::B);
    assert_eq!(
        serde_json::to_value(&questions[0]).unwrap()["correct_answer"],
        "b"
    );
}

#[test]
fn test_json_array_inside_markdown_fence() {
    let response = "Sure! Here are your questions:\n```json\n[\n  {\"question\": \"What is a lifetime?\", \"option_a\": \"A scope annotation\", \"option_b\": \"A GC pause\", \"option_c\": \"A thread\", \"option_d\": \"A macro\", \"correct_answer\": \"A\"}\n]\n```\nLet me know if you need more.";
    let questions = parse_quiz_response(response);

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].correct_answer, AnswerOption::A);
}

#[test]
fn test_valid_entries_returned_in_original_order() {
    let entries: Vec<String> = (0..6)
        .map(|i| {
            format!(
                r#"{{"question":"Question number {i}?","option_a":"a","option_b":"b","option_c":"c","option_d":"d","correct_answer":"{}"}}"#,
                ["a", "b", "c", "d"][i % 4]
            )
        })
        .collect();
    let response = format!("[{}]", entries.join(","));

    let questions = parse_quiz_response(&response);
    assert_eq!(questions.len(), 6);
    for (i, question) in questions.iter().enumerate() {
        assert_eq!(question.question, format!("Question number {}?", i));
    }
}

#[test]
fn test_entries_missing_fields_or_with_bad_letters_are_dropped() {
    let response = r#"[
        {"question":"Good?","option_a":"1","option_b":"2","option_c":"3","option_d":"4","correct_answer":"c"},
        {"question":"No options?","correct_answer":"a"},
        {"question":"Letter out of range?","option_a":"1","option_b":"2","option_c":"3","option_d":"4","correct_answer":"f"},
        {"question":"","option_a":"1","option_b":"2","option_c":"3","option_d":"4","correct_answer":"a"},
        {"question":"Also good?","option_a":"1","option_b":"2","option_c":"3","option_d":"4","correct_answer":"D"}
    ]"#;

    let questions = parse_quiz_response(response);
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].question, "Good?");
    assert_eq!(questions[1].question, "Also good?");
    assert_eq!(questions[1].correct_answer, AnswerOption::D);
}

// Quiz parsing: heuristic block tier

#[test]
fn test_numbered_question_blocks_without_json() {
    let response = "\
Question 1: Which keyword introduces a lifetime parameter?
a) fn
b) for
c) 'a in angle brackets
d) impl
Correct Answer: c

Question 2: What does the borrow checker enforce?
a) Code style
b) Aliasing rules
c) Naming conventions
d) Link order
Answer: b";

    let questions = parse_quiz_response(response);
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].option_c, "'a in angle brackets");
    assert_eq!(questions[0].correct_answer, AnswerOption::C);
    assert_eq!(questions[1].question, "What does the borrow checker enforce?");
    assert_eq!(questions[1].correct_answer, AnswerOption::B);
}

#[test]
fn test_block_options_may_span_multiple_lines() {
    let response = "\
Question 1: Why does Rust have no data races?
a) Ownership and borrowing rules
   prevent shared mutable state
b) The runtime locks everything
c) Threads are not supported
d) The compiler inserts mutexes
Answer: a";

    let questions = parse_quiz_response(response);
    assert_eq!(questions.len(), 1);
    assert!(questions[0].option_a.contains("prevent shared mutable state"));
}

#[test]
fn test_block_with_embedded_correct_answer_phrase() {
    let response = "Question 1: Pick one.\na) x\nb) y\nc) z\nd) w\nThe correct answer is (d) because w.";
    let questions = parse_quiz_response(response);
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].correct_answer, AnswerOption::D);
}

#[test]
fn test_block_without_answer_letter_is_discarded() {
    let response = "Question 1: Pick one.\na) x\nb) y\nc) z\nd) w\nNo answer given here.";
    assert!(parse_quiz_response(response).is_empty());
}

#[test]
fn test_completely_unstructured_text_yields_empty_list() {
    assert!(parse_quiz_response("The weather is nice today.").is_empty());
    assert!(parse_quiz_response("").is_empty());
}

// Video summary parsing

#[test]
fn test_video_json_object_with_required_keys() {
    let response = r#"{"summary": "Covers pattern matching.", "key_points": ["match arms", "guards"], "actionable_takeaways": ["refactor an if chain"]}"#;
    let content = parse_video_response(response);

    assert_eq!(content.summary, "Covers pattern matching.");
    assert_eq!(content.key_points.len(), 2);
    assert_eq!(content.actionable_takeaways.len(), 1);
}

#[test]
fn test_video_json_missing_required_key_falls_through() {
    // No actionable_takeaways key: the JSON tier must fail and the section
    // tier finds nothing, so the raw response becomes the summary.
    let response = r#"{"summary": "Partial.", "key_points": ["one"]}"#;
    let content = parse_video_response(response);

    assert_eq!(content.summary, response.trim());
    assert!(content.key_points.is_empty());
}

#[test]
fn test_video_section_headers_with_mixed_bullets() {
    let response = "\
**Summary:**
An overview of tokio runtimes.

Key Points:
- Work stealing scheduler
* Multi-threaded by default
2. Blocking pool is separate

Actionable Takeaways:
1) Use spawn_blocking for CPU work
- Benchmark before tuning worker counts";

    let content = parse_video_response(response);
    assert_eq!(content.summary, "An overview of tokio runtimes.");
    assert_eq!(content.key_points.len(), 3);
    assert_eq!(content.actionable_takeaways.len(), 2);
}

#[test]
fn test_video_raw_passthrough_is_never_a_failure() {
    let raw = "no structure whatsoever";
    let content = parse_video_response(raw);
    assert_eq!(content.summary, raw);
    assert!(content.key_points.is_empty());
    assert!(content.actionable_takeaways.is_empty());
}

// Learning plan parsing

#[test]
fn test_plan_json_with_topics_and_resources() {
    let response = r#"{
        "summary": "Review ownership.",
        "roadmap": "mindmap\n  root((Study Plan))\n    Ownership\n      Core Concepts",
        "topics": [
            {
                "topic": "Ownership",
                "description": "Moves and borrows were confused.",
                "priority": 2,
                "resources": [
                    {"description": "Re-read chapter 4", "url": "https://doc.rust-lang.org/book/ch04-00-understanding-ownership.html", "type": "reading"},
                    {"description": "Do the ownership exercises", "url": null, "type": "exercise"}
                ]
            }
        ]
    }"#;

    let plan = parse_plan_response(response);
    assert_eq!(plan.summary, "Review ownership.");
    assert!(plan.roadmap.unwrap().contains("root((Study Plan))"));
    assert_eq!(plan.topics.len(), 1);
    assert_eq!(plan.topics[0].priority, Some(2));
    assert_eq!(plan.topics[0].resources.len(), 2);
    assert_eq!(plan.topics[0].resources[0].resource_type.as_deref(), Some("reading"));
    assert!(plan.topics[0].resources[1].url.is_none());
}

#[test]
fn test_plan_invalid_topic_entries_are_skipped_not_fatal() {
    let response = r#"{
        "summary": "Mixed quality response.",
        "topics": [
            {"topic": "Valid Topic", "description": "ok"},
            {"description": "missing topic name"},
            {"topic": ""},
            "not even an object"
        ]
    }"#;

    let plan = parse_plan_response(response);
    assert_eq!(plan.summary, "Mixed quality response.");
    assert_eq!(plan.topics.len(), 1);
    assert_eq!(plan.topics[0].topic, "Valid Topic");
}

#[test]
fn test_plan_section_tier_recovers_summary_and_mindmap() {
    let response = "\
Summary:
Work through generics again.

Here is a diagram:
mindmap
  root((Generics))
    Trait Bounds";

    let plan = parse_plan_response(response);
    assert_eq!(plan.summary.lines().next(), Some("Work through generics again."));
    assert!(plan.roadmap.unwrap().starts_with("mindmap"));
    assert!(plan.topics.is_empty());
}
