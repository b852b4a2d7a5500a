use axum::{
    Router,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tracing::error;
use uuid::Uuid;

use crate::{
    document_service::DocumentService,
    errors::ErrorContext,
    models::*,
    plan_service::PlanService,
    quiz_service::QuizService,
    video_service::VideoService,
};

// Import logging macros
use crate::{log_api_start, log_api_success};

#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentService,
    pub quizzes: QuizService,
    pub plans: PlanService,
    pub videos: VideoService,
}

#[derive(Deserialize)]
pub struct PlanQuery {
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

type HandlerResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

// Document endpoints
pub async fn create_document(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> HandlerResult<Document> {
    log_api_start!("create_document");

    match state.documents.create_document(request).await {
        Ok(document) => {
            log_api_success!("create_document", document_id = document.id, "document created");
            Ok(Json(ApiResponse::success(document)))
        }
        Err(e) => Err(e.to_response_with_context(ErrorContext::new("create_document", "document"))),
    }
}

pub async fn list_documents(State(state): State<AppState>) -> HandlerResult<Vec<Document>> {
    log_api_start!("list_documents");

    match state.documents.get_all_documents().await {
        Ok(documents) => {
            log_api_success!("list_documents", count = documents.len(), "documents listed");
            Ok(Json(ApiResponse::success(documents)))
        }
        Err(e) => Err(e.to_response_with_context(ErrorContext::new("list_documents", "document"))),
    }
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Document> {
    log_api_start!("get_document", document_id = id);

    match state.documents.get_document(id).await {
        Ok(document) => Ok(Json(ApiResponse::success(document))),
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("get_document", "document").with_id(&id.to_string()),
        )),
    }
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<()> {
    log_api_start!("delete_document", document_id = id);

    match state.documents.delete_document(id).await {
        Ok(()) => {
            log_api_success!("delete_document", document_id = id, "document deleted");
            Ok(Json(ApiResponse::success(())))
        }
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("delete_document", "document").with_id(&id.to_string()),
        )),
    }
}

pub async fn summarize_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Document> {
    log_api_start!("summarize_document", document_id = id);

    match state.documents.generate_summary(id).await {
        Ok(document) => {
            log_api_success!("summarize_document", document_id = id, "summary generated");
            Ok(Json(ApiResponse::success(document)))
        }
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("summarize_document", "document").with_id(&id.to_string()),
        )),
    }
}

/// Streaming summary: chunks are written to the client as the backend emits
/// them, over a single persistent response.
pub async fn stream_document_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, (StatusCode, Json<ApiResponse<()>>)> {
    log_api_start!("stream_document_summary", document_id = id);

    let document = match state.documents.get_document(id).await {
        Ok(document) => document,
        Err(e) => {
            return Err(e.to_response_with_context(
                ErrorContext::new("stream_document_summary", "document").with_id(&id.to_string()),
            ));
        }
    };

    let (tx, rx) = mpsc::channel::<String>(16);
    let documents = state.documents.clone();
    tokio::spawn(async move {
        if let Err(e) = documents.stream_summary(document, tx).await {
            error!(document_id = %id, error = %e, "Streamed summary persistence failed");
        }
    });

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|chunk| (Ok::<_, Infallible>(Bytes::from(chunk)), rx))
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(stream))
        .map_err(|e| {
            error!(error = %e, "Could not build streaming response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Could not start summary stream".to_string())),
            )
        })
}

// Quiz endpoints
pub async fn create_quiz(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Json(request): Json<CreateQuizRequest>,
) -> HandlerResult<QuizWithQuestions> {
    log_api_start!("create_quiz", document_id = document_id);

    match state.quizzes.create_quiz(document_id, request).await {
        Ok(quiz) => {
            log_api_success!("create_quiz", quiz_id = quiz.quiz.id, "quiz generated");
            Ok(Json(ApiResponse::success(quiz)))
        }
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("create_quiz", "quiz").with_id(&document_id.to_string()),
        )),
    }
}

pub async fn list_document_quizzes(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> HandlerResult<Vec<Quiz>> {
    log_api_start!("list_document_quizzes", document_id = document_id);

    match state.quizzes.get_quizzes_for_document(document_id).await {
        Ok(quizzes) => Ok(Json(ApiResponse::success(quizzes))),
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("list_document_quizzes", "quiz").with_id(&document_id.to_string()),
        )),
    }
}

pub async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<QuizWithQuestions> {
    log_api_start!("get_quiz", quiz_id = id);

    match state.quizzes.get_quiz(id).await {
        Ok(quiz) => Ok(Json(ApiResponse::success(quiz))),
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("get_quiz", "quiz").with_id(&id.to_string()),
        )),
    }
}

// Attempt endpoints
pub async fn submit_attempt(
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
    Json(request): Json<SubmitAttemptRequest>,
) -> HandlerResult<AttemptWithAnswers> {
    log_api_start!("submit_attempt", quiz_id = quiz_id);

    match state.quizzes.submit_attempt(quiz_id, request).await {
        Ok(attempt) => {
            log_api_success!("submit_attempt", quiz_id = quiz_id, "attempt scored");
            Ok(Json(ApiResponse::success(attempt)))
        }
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("submit_attempt", "attempt").with_id(&quiz_id.to_string()),
        )),
    }
}

pub async fn get_attempt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<AttemptWithAnswers> {
    log_api_start!("get_attempt", attempt_id = id);

    match state.quizzes.get_attempt(id).await {
        Ok(attempt) => Ok(Json(ApiResponse::success(attempt))),
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("get_attempt", "attempt").with_id(&id.to_string()),
        )),
    }
}

// Learning plan endpoints
pub async fn create_plan(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    Json(request): Json<CreatePlanRequest>,
) -> HandlerResult<PlanWithResources> {
    log_api_start!("create_plan", attempt_id = attempt_id);

    match state.plans.generate_plan(attempt_id, request).await {
        Ok(plan) => {
            log_api_success!("create_plan", plan_id = plan.plan.id, "learning plan generated");
            Ok(Json(ApiResponse::success(plan)))
        }
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("create_plan", "plan").with_id(&attempt_id.to_string()),
        )),
    }
}

pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PlanQuery>,
) -> HandlerResult<PlanWithResources> {
    log_api_start!("get_plan", plan_id = id);

    match state.plans.get_plan(id, query.user_id.as_deref()).await {
        Ok(plan) => Ok(Json(ApiResponse::success(plan))),
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("get_plan", "plan").with_id(&id.to_string()),
        )),
    }
}

// Video summary endpoints
pub async fn create_video_summary(
    State(state): State<AppState>,
    Json(request): Json<CreateVideoSummaryRequest>,
) -> HandlerResult<VideoSummary> {
    log_api_start!("create_video_summary");

    match state.videos.create_summary(request).await {
        Ok(summary) => {
            log_api_success!(
                "create_video_summary",
                video_summary_id = summary.id,
                "video summary generated"
            );
            Ok(Json(ApiResponse::success(summary)))
        }
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("create_video_summary", "video summary"),
        )),
    }
}

pub async fn get_video_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<VideoSummary> {
    log_api_start!("get_video_summary", video_summary_id = id);

    match state.videos.get_summary(id).await {
        Ok(summary) => Ok(Json(ApiResponse::success(summary))),
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("get_video_summary", "video summary").with_id(&id.to_string()),
        )),
    }
}

pub async fn save_video_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SaveVideoSummaryRequest>,
) -> HandlerResult<VideoSummary> {
    log_api_start!("save_video_summary", video_summary_id = id);

    match state.videos.set_saved(id, request.saved).await {
        Ok(summary) => {
            log_api_success!(
                "save_video_summary",
                video_summary_id = summary.id,
                "saved flag updated"
            );
            Ok(Json(ApiResponse::success(summary)))
        }
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new("save_video_summary", "video summary").with_id(&id.to_string()),
        )),
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/documents", post(create_document).get(list_documents))
        .route("/api/documents/:id", get(get_document).delete(delete_document))
        .route("/api/documents/:id/summarize", post(summarize_document))
        .route("/api/documents/:id/summarize/stream", get(stream_document_summary))
        .route("/api/documents/:id/quizzes", post(create_quiz).get(list_document_quizzes))
        .route("/api/quizzes/:id", get(get_quiz))
        .route("/api/quizzes/:id/attempts", post(submit_attempt))
        .route("/api/attempts/:id", get(get_attempt))
        .route("/api/attempts/:id/plan", post(create_plan))
        .route("/api/plans/:id", get(get_plan))
        .route("/api/videos/summaries", post(create_video_summary))
        .route("/api/videos/summaries/:id", get(get_video_summary))
        .route("/api/videos/summaries/:id/save", post(save_video_summary))
        .with_state(state)
}
