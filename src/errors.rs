use crate::api::ApiResponse;
use axum::{http::StatusCode, response::Json};
use tracing::{error, info, warn};

/// Centralized error taxonomy.
///
/// Validation and forbidden errors are caller faults and are returned with
/// their message intact; external-service and malformed-response errors are
/// logged server-side and surfaced only as a generic retry message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Business-rule failure of quiz generation: the backend answered but no
    /// valid question could be extracted. The owning quiz is marked failed.
    #[error("Quiz generation failed: {0}")]
    QuizGeneration(String),

    #[error("AI backend error: {0}")]
    ExternalService(String),

    /// Backend reachable but its output survived none of the parser tiers.
    #[error("Unparsable AI response: {0}")]
    MalformedResponse(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] anyhow::Error),
}

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::QuizGeneration(_) => StatusCode::BAD_GATEWAY,
            ApiError::ExternalService(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to an HTTP response with consistent structure and logging.
    pub fn to_response_with_context(
        self,
        context: ErrorContext,
    ) -> (StatusCode, Json<ApiResponse<()>>) {
        let status = self.status_code();
        match &self {
            ApiError::NotFound(_) => {
                info!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Resource not found"
                );
                (
                    status,
                    Json(ApiResponse::error(format!(
                        "{} not found",
                        context.resource_type
                    ))),
                )
            }
            ApiError::ValidationError(_) | ApiError::Forbidden(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Request rejected"
                );
                (status, Json(ApiResponse::error(self.to_string())))
            }
            ApiError::QuizGeneration(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Quiz generation produced no usable questions"
                );
                (
                    status,
                    Json(ApiResponse::error(
                        "Could not generate quiz questions from this document. Please try again."
                            .to_string(),
                    )),
                )
            }
            ApiError::ExternalService(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "AI backend call failed"
                );
                (
                    status,
                    Json(ApiResponse::error(
                        "AI service temporarily unavailable. Please try again.".to_string(),
                    )),
                )
            }
            ApiError::MalformedResponse(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "AI response survived no parser tier"
                );
                (
                    status,
                    Json(ApiResponse::error(
                        "The AI service returned an unusable response. Please try again."
                            .to_string(),
                    )),
                )
            }
            ApiError::DatabaseError(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Database error"
                );
                (
                    status,
                    Json(ApiResponse::error(
                        "Database operation failed. Please try again.".to_string(),
                    )),
                )
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(anyhow::Error::from(err))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("quiz".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::ValidationError("bad url".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Forbidden("not your attempt".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::QuizGeneration("zero questions".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::ExternalService("timeout".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::DatabaseError(anyhow::anyhow!("locked")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_context_builder() {
        let context = ErrorContext::new("create_quiz", "quiz").with_id("abc-123");
        assert_eq!(context.operation, "create_quiz");
        assert_eq!(context.resource_type, "quiz");
        assert_eq!(context.resource_id, Some("abc-123".to_string()));
    }

    #[test]
    fn test_validation_message_passes_through_but_backend_detail_does_not() {
        let (status, response) = ApiError::ValidationError("question_count must be at least 1".into())
            .to_response_with_context(ErrorContext::new("create_quiz", "quiz"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.0.error.as_deref(),
            Some("Validation error: question_count must be at least 1")
        );

        let (status, response) = ApiError::ExternalService("api key leaked in detail".into())
            .to_response_with_context(ErrorContext::new("summarize", "document"));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let message = response.0.error.unwrap();
        assert!(!message.contains("api key"));
    }
}
