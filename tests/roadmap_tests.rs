use studypath::models::{AnswerOption, IncorrectAnswer};
use studypath::roadmap::{build_roadmap, fallback_mindmap, normalize_roadmap};

fn incorrect(question: &str) -> IncorrectAnswer {
    IncorrectAnswer {
        question: question.to_string(),
        selected_answer: None,
        correct_answer: AnswerOption::A,
    }
}

#[test]
fn test_roadmap_with_newlines_is_returned_byte_for_byte() {
    // Includes odd indentation and trailing whitespace on purpose: the
    // passthrough tier must not normalize anything.
    let roadmap = "mindmap\n   root((Physics)) \n    Forces\n      Newton's Laws  ";
    assert_eq!(normalize_roadmap(roadmap).as_deref(), Some(roadmap));
}

#[test]
fn test_postprocessor_is_idempotent() {
    let flat = "mindmap root((Networking)) Packet Switching Core Concepts Worked Examples \
                Practice Exercises Master Subject Final Assessment Ongoing Practice";
    let once = normalize_roadmap(flat).unwrap();
    let twice = normalize_roadmap(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_reconstruction_uses_fixed_indent_levels() {
    let flat = "mindmap root((Databases)) Index Basics Introduction Key Terminology \
                Fundamental Principles";
    let rebuilt = normalize_roadmap(flat).unwrap();

    for line in rebuilt.lines().skip(1) {
        let indent = line.len() - line.trim_start().len();
        assert!(
            indent == 2 || indent == 4 || indent == 6,
            "unexpected indent {} in '{}'",
            indent,
            line
        );
    }
    assert!(rebuilt.contains("  root((Databases))"));
    assert!(rebuilt.contains("    Index Basics"));
    assert!(rebuilt.contains("      Introduction"));
}

#[test]
fn test_flat_text_outside_vocabulary_falls_back_to_generic_generator() {
    let incorrect_answers = vec![incorrect("Explain quorum reads in Cassandra.")];
    let roadmap = build_roadmap(Some("florb glorp znak"), &incorrect_answers);
    assert!(roadmap.contains("root((Study Plan))"));
    assert!(roadmap.contains("    Explain quorum reads in"));
    assert!(roadmap.contains("    Master Subject"));
}

#[test]
fn test_flat_line_with_root_but_unknown_vocabulary_falls_back() {
    assert_eq!(
        normalize_roadmap("mindmap root((Distributed Systems)) florb glorp"),
        None
    );

    let incorrect_answers = vec![incorrect("Define eventual consistency precisely.")];
    let roadmap = build_roadmap(
        Some("mindmap root((Distributed Systems)) florb glorp"),
        &incorrect_answers,
    );
    assert!(roadmap.contains("root((Study Plan))"));
    assert!(roadmap.contains("    Define eventual consistency precisely"));
}

#[test]
fn test_missing_roadmap_falls_back() {
    let incorrect_answers = vec![incorrect("What is the difference between TCP and UDP?")];
    let roadmap = build_roadmap(None, &incorrect_answers);

    assert!(roadmap.starts_with("mindmap\n  root((Study Plan))"));
    // "difference" keyword selects the comparison subtopic table.
    assert!(roadmap.contains("      Key Differences"));
}

#[test]
fn test_fallback_closing_branch_has_exactly_two_leaves() {
    let incorrect_answers = vec![
        incorrect("How do B-trees split nodes?"),
        incorrect("What are basic indexing concepts?"),
    ];
    let roadmap = fallback_mindmap(&incorrect_answers);
    let lines: Vec<&str> = roadmap.lines().collect();

    let closing = lines
        .iter()
        .position(|line| *line == "    Master Subject")
        .expect("closing branch present");
    let leaves: Vec<&str> = lines[closing + 1..]
        .iter()
        .take_while(|line| line.starts_with("      "))
        .copied()
        .collect();
    assert_eq!(leaves.len(), 2);
    assert!(lines[closing + 1..].len() == 2, "closing branch is last");
}

#[test]
fn test_fallback_with_no_questions_still_produces_a_topic() {
    let roadmap = fallback_mindmap(&[]);
    let topics: Vec<&str> = roadmap
        .lines()
        .filter(|line| line.starts_with("    ") && !line.starts_with("      "))
        .collect();
    assert!(topics.len() >= 2);
}
