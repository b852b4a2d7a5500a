//! Failure-path behavior against a misbehaving live backend: a stub HTTP
//! server stands in for the generative-text API and replies with garbage or
//! server errors.

use axum::{Json, Router, http::StatusCode};
use serde_json::json;
use studypath::ai_gateway::{AiGateway, is_suspicious_summary};
use studypath::config::AiConfig;
use studypath::errors::ApiError;
use studypath::models::{CreateDocumentRequest, CreateQuizRequest, GenerationStatus};
use studypath::{Database, DocumentService, QuizService};

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Reachable backend, well-formed envelope, unusable payload.
async fn garbage_backend_url() -> String {
    async fn reply() -> Json<serde_json::Value> {
        Json(json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "I looked at the input but nothing structured came out."}]
                }
            }]
        }))
    }
    spawn_stub(Router::new().fallback(reply)).await
}

/// Backend that always answers with a server error.
async fn broken_backend_url() -> String {
    async fn reply() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
    spawn_stub(Router::new().fallback(reply)).await
}

fn gateway_against(base_url: String) -> AiGateway {
    AiGateway::from_config(&AiConfig {
        api_key: "AIza-test-key".to_string(),
        base_url: Some(base_url),
        model: None,
    })
}

#[tokio::test]
async fn test_unparsable_quiz_response_raises_domain_error() {
    let gateway = gateway_against(garbage_backend_url().await);

    let error = gateway.generate_quiz("document text", 3).await.unwrap_err();
    assert!(matches!(error, ApiError::QuizGeneration(_)));
    assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_quiz_creation_flow_marks_quiz_failed_and_persists_no_questions() {
    let db = Database::new("sqlite::memory:").await.unwrap();
    let gateway = gateway_against(garbage_backend_url().await);
    let documents = DocumentService::new(db.clone(), gateway.clone());
    let quizzes = QuizService::new(db.clone(), gateway);

    let document = documents
        .create_document(CreateDocumentRequest {
            title: "Doc".to_string(),
            content: "Some content.".to_string(),
        })
        .await
        .unwrap();

    let result = quizzes
        .create_quiz(
            document.id,
            CreateQuizRequest {
                title: None,
                question_count: 3,
            },
        )
        .await;
    assert!(matches!(result, Err(ApiError::QuizGeneration(_))));

    let stored = db.get_quizzes_for_document(document.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, GenerationStatus::Failed);

    let questions = db.get_questions_for_quiz(stored[0].id).await.unwrap();
    assert!(questions.is_empty());
}

#[tokio::test]
async fn test_transport_failure_degrades_quiz_generation_to_simulator() {
    let gateway = gateway_against(broken_backend_url().await);

    let questions = gateway.generate_quiz("document text", 2).await.unwrap();
    assert_eq!(questions.len(), 2);
}

#[tokio::test]
async fn test_refusal_then_refusal_degrades_summary_to_simulator() {
    // The garbage payload is short enough to count as suspicious, so the
    // gateway retries once and then falls back to the simulated summary.
    let gateway = gateway_against(garbage_backend_url().await);

    let summary = gateway.summarize("document text").await;
    assert!(!is_suspicious_summary(&summary));
}

#[tokio::test]
async fn test_transport_failure_degrades_summary_to_simulator() {
    let gateway = gateway_against(broken_backend_url().await);

    let summary = gateway.summarize("document text").await;
    assert!(!is_suspicious_summary(&summary));
}

#[tokio::test]
async fn test_garbage_video_response_passes_through_as_raw_summary() {
    let gateway = gateway_against(garbage_backend_url().await);

    let (video_id, content) = gateway
        .summarize_video("https://youtu.be/dQw4w9WgXcQ")
        .await
        .unwrap();
    assert_eq!(video_id, "dQw4w9WgXcQ");
    assert_eq!(
        content.summary,
        "I looked at the input but nothing structured came out."
    );
    assert!(content.key_points.is_empty());
}

#[tokio::test]
async fn test_validation_errors_never_reach_the_backend() {
    // Even against a broken backend, a bad URL is rejected up front.
    let gateway = gateway_against(broken_backend_url().await);

    let error = gateway
        .summarize_video("ftp://not-a-video")
        .await
        .unwrap_err();
    assert!(matches!(error, ApiError::ValidationError(_)));
    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
}
