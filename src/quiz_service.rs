use chrono::Utc;
use std::collections::HashSet;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    ai_gateway::AiGateway,
    database::Database,
    errors::{ApiError, ApiResult},
    log_service_start, log_service_success,
    models::{
        AnswerOption, AttemptWithAnswers, CreateQuizRequest, GenerationStatus, Quiz, QuizAnswer,
        QuizAttempt, QuizWithQuestions, SubmitAttemptRequest,
    },
};

const MAX_QUESTION_COUNT: i64 = 50;

/// Quiz generation and attempt scoring.
#[derive(Clone)]
pub struct QuizService {
    db: Database,
    gateway: AiGateway,
}

impl QuizService {
    pub fn new(db: Database, gateway: AiGateway) -> Self {
        Self { db, gateway }
    }

    /// Generate a quiz from a document, inline. The quiz row is created
    /// pending, moves to processing for the AI call, and ends completed with
    /// min(requested, parsed) questions — or failed with zero questions when
    /// generation produced nothing usable.
    pub async fn create_quiz(
        &self,
        document_id: Uuid,
        request: CreateQuizRequest,
    ) -> ApiResult<QuizWithQuestions> {
        if request.question_count < 1 || request.question_count > MAX_QUESTION_COUNT {
            return Err(ApiError::ValidationError(format!(
                "question_count must be between 1 and {}",
                MAX_QUESTION_COUNT
            )));
        }

        let document = self
            .db
            .get_document(document_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Document with id '{}' not found", document_id))
            })?;

        log_service_start!("quiz_service", "create_quiz", document_id = document_id);

        let title = request
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| format!("Quiz: {}", document.title));
        let quiz = self
            .db
            .create_quiz(document_id, title, request.question_count)
            .await?;
        self.db
            .update_quiz_status(quiz.id, GenerationStatus::Processing)
            .await?;

        let requested = request.question_count as usize;
        let mut parsed = match self.gateway.generate_quiz(&document.content, requested).await {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(quiz_id = %quiz.id, error = %e, "Quiz generation failed, marking quiz failed");
                self.db
                    .update_quiz_status(quiz.id, GenerationStatus::Failed)
                    .await?;
                return Err(e);
            }
        };
        parsed.truncate(requested);

        let questions = match self.db.insert_quiz_questions(quiz.id, &parsed).await {
            Ok(questions) => questions,
            Err(e) => {
                error!(quiz_id = %quiz.id, error = %e, "Persisting questions failed, marking quiz failed");
                self.db
                    .update_quiz_status(quiz.id, GenerationStatus::Failed)
                    .await?;
                return Err(ApiError::DatabaseError(e));
            }
        };
        self.db.complete_quiz(quiz.id, questions.len() as i64).await?;

        log_service_success!(
            "quiz_service",
            "create_quiz",
            count = questions.len(),
            "quiz generated"
        );
        self.get_quiz(quiz.id).await
    }

    pub async fn get_quiz(&self, id: Uuid) -> ApiResult<QuizWithQuestions> {
        let quiz = self
            .db
            .get_quiz(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Quiz with id '{}' not found", id)))?;
        let questions = self.db.get_questions_for_quiz(id).await?;

        Ok(QuizWithQuestions { quiz, questions })
    }

    pub async fn get_quizzes_for_document(&self, document_id: Uuid) -> ApiResult<Vec<Quiz>> {
        Ok(self.db.get_quizzes_for_document(document_id).await?)
    }

    /// Score and persist an attempt. The submission must answer every
    /// question of the quiz exactly once; unanswered slots are submitted
    /// explicitly with a null selection and score as incorrect.
    pub async fn submit_attempt(
        &self,
        quiz_id: Uuid,
        request: SubmitAttemptRequest,
    ) -> ApiResult<AttemptWithAnswers> {
        if request.user_id.trim().is_empty() {
            return Err(ApiError::ValidationError("user_id cannot be empty".to_string()));
        }

        let quiz = self
            .db
            .get_quiz(quiz_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))?;
        if quiz.status != GenerationStatus::Completed {
            return Err(ApiError::ValidationError(format!(
                "quiz is not ready for attempts (status: {})",
                quiz.status.as_str()
            )));
        }

        let questions = self.db.get_questions_for_quiz(quiz_id).await?;
        if request.answers.len() != questions.len() {
            return Err(ApiError::ValidationError(format!(
                "expected {} answers, got {}",
                questions.len(),
                request.answers.len()
            )));
        }

        let mut seen: HashSet<Uuid> = HashSet::new();
        let attempt_id = Uuid::new_v4();
        let mut answers = Vec::with_capacity(request.answers.len());
        let mut score = 0i64;

        for submitted in &request.answers {
            let question = questions
                .iter()
                .find(|question| question.id == submitted.question_id)
                .ok_or_else(|| {
                    ApiError::ValidationError(format!(
                        "question '{}' does not belong to this quiz",
                        submitted.question_id
                    ))
                })?;
            if !seen.insert(submitted.question_id) {
                return Err(ApiError::ValidationError(format!(
                    "question '{}' answered more than once",
                    submitted.question_id
                )));
            }

            let selected = match submitted.selected_answer.as_deref() {
                None => None,
                Some(raw) => Some(AnswerOption::parse(raw).ok_or_else(|| {
                    ApiError::ValidationError(format!(
                        "selected_answer '{}' is not one of a, b, c, d",
                        raw
                    ))
                })?),
            };

            let is_correct = selected == Some(question.correct_answer);
            if is_correct {
                score += 1;
            }

            answers.push(QuizAnswer {
                id: Uuid::new_v4(),
                attempt_id,
                question_id: question.id,
                selected_answer: selected,
                is_correct,
            });
        }

        let attempt = QuizAttempt {
            id: attempt_id,
            quiz_id,
            user_id: request.user_id,
            score,
            total: questions.len() as i64,
            completed_at: Utc::now(),
        };
        self.db.create_attempt(&attempt, &answers).await?;

        info!(
            attempt_id = %attempt.id,
            quiz_id = %quiz_id,
            score = attempt.score,
            total = attempt.total,
            "Attempt scored and persisted"
        );
        Ok(AttemptWithAnswers { attempt, answers })
    }

    pub async fn get_attempt(&self, id: Uuid) -> ApiResult<AttemptWithAnswers> {
        let attempt = self
            .db
            .get_attempt(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Attempt with id '{}' not found", id)))?;
        let answers = self.db.get_answers_for_attempt(id).await?;

        Ok(AttemptWithAnswers { attempt, answers })
    }
}
