use chrono::Utc;
use std::collections::HashMap;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    ai_gateway::AiGateway,
    database::Database,
    errors::{ApiError, ApiResult},
    log_service_start, log_service_warn,
    models::{
        CreatePlanRequest, GenerationStatus, IncorrectAnswer, LearningPlan, LearningResource,
        PlanWithResources, QuizAttempt,
    },
    roadmap,
};

const CONGRATULATORY_SUMMARY: &str =
    "Congratulations! You answered every question correctly. There is nothing to remediate — \
     keep the material fresh with an occasional review, and consider a harder quiz next time.";

const DEFAULT_PLAN_SUMMARY: &str =
    "Focus your review on the topics below, working top to bottom, then re-take the quiz to \
     confirm the gaps are closed.";

const DEFAULT_RESOURCE_PRIORITY: i64 = 1;

/// Learning-plan generation from a completed quiz attempt.
#[derive(Clone)]
pub struct PlanService {
    db: Database,
    gateway: AiGateway,
}

impl PlanService {
    pub fn new(db: Database, gateway: AiGateway) -> Self {
        Self { db, gateway }
    }

    /// Create a remediation plan for an attempt. A perfect attempt
    /// short-circuits to a completed congratulatory plan with no resources.
    /// Any failure after the plan row exists marks it failed and propagates.
    pub async fn generate_plan(
        &self,
        attempt_id: Uuid,
        request: CreatePlanRequest,
    ) -> ApiResult<PlanWithResources> {
        if request.user_id.trim().is_empty() {
            return Err(ApiError::ValidationError("user_id cannot be empty".to_string()));
        }

        let attempt = self
            .db
            .get_attempt(attempt_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Attempt with id '{}' not found", attempt_id))
            })?;
        if attempt.user_id != request.user_id {
            return Err(ApiError::Forbidden(
                "attempt belongs to a different user".to_string(),
            ));
        }

        log_service_start!("plan_service", "generate_plan", attempt_id = attempt_id);

        let plan = LearningPlan {
            id: Uuid::new_v4(),
            attempt_id,
            user_id: request.user_id,
            summary: String::new(),
            roadmap: String::new(),
            status: GenerationStatus::Pending,
            created_at: Utc::now(),
        };
        self.db.create_plan(&plan).await?;

        let incorrect = self.collect_incorrect_answers(&attempt).await?;
        if incorrect.is_empty() {
            info!(plan_id = %plan.id, "Perfect attempt, completing plan without resources");
            self.db
                .complete_plan(plan.id, CONGRATULATORY_SUMMARY, "")
                .await?;
            return self.get_plan(plan.id, Some(&plan.user_id)).await;
        }

        self.db
            .update_plan_status(plan.id, GenerationStatus::Processing)
            .await?;

        if let Err(e) = self.build_plan_content(&plan, &attempt, &incorrect).await {
            error!(plan_id = %plan.id, error = %e, "Plan generation failed, marking plan failed");
            if let Err(mark_err) = self
                .db
                .update_plan_status(plan.id, GenerationStatus::Failed)
                .await
            {
                error!(plan_id = %plan.id, error = %mark_err, "Could not mark plan failed");
            }
            return Err(e);
        }

        self.get_plan(plan.id, Some(&plan.user_id)).await
    }

    pub async fn get_plan(&self, id: Uuid, user_id: Option<&str>) -> ApiResult<PlanWithResources> {
        let plan = self
            .db
            .get_plan(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Plan with id '{}' not found", id)))?;
        if let Some(user_id) = user_id {
            if plan.user_id != user_id {
                return Err(ApiError::Forbidden("plan belongs to a different user".to_string()));
            }
        }

        let resources = self.db.get_resources_for_plan(id).await?;
        Ok(PlanWithResources { plan, resources })
    }

    /// Answers with is_correct = false, each paired with its question's text
    /// and both option letters.
    async fn collect_incorrect_answers(
        &self,
        attempt: &QuizAttempt,
    ) -> ApiResult<Vec<IncorrectAnswer>> {
        let answers = self.db.get_answers_for_attempt(attempt.id).await?;
        let questions = self.db.get_questions_for_quiz(attempt.quiz_id).await?;
        let by_id: HashMap<Uuid, &crate::models::QuizQuestion> =
            questions.iter().map(|question| (question.id, question)).collect();

        Ok(answers
            .iter()
            .filter(|answer| !answer.is_correct)
            .filter_map(|answer| {
                by_id.get(&answer.question_id).map(|question| IncorrectAnswer {
                    question: question.question.clone(),
                    selected_answer: answer.selected_answer,
                    correct_answer: question.correct_answer,
                })
            })
            .collect())
    }

    /// Steps 3-5 of generation: remediation content from the gateway, roadmap
    /// post-processing, and resource persistence. Errors here fail the plan.
    async fn build_plan_content(
        &self,
        plan: &LearningPlan,
        attempt: &QuizAttempt,
        incorrect: &[IncorrectAnswer],
    ) -> ApiResult<()> {
        let quiz = self
            .db
            .get_quiz(attempt.quiz_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Quiz with id '{}' not found", attempt.quiz_id))
            })?;
        let document = self
            .db
            .get_document(quiz.document_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Document with id '{}' not found", quiz.document_id))
            })?;

        let generated = self
            .gateway
            .generate_learning_resources(&document.content, incorrect)
            .await;

        let roadmap_text = roadmap::build_roadmap(generated.roadmap.as_deref(), incorrect);
        let summary = if generated.summary.trim().is_empty() {
            DEFAULT_PLAN_SUMMARY.to_string()
        } else {
            generated.summary
        };

        if generated.topics.is_empty() {
            log_service_warn!(
                "plan_service",
                "build_plan_content",
                "no usable topics in backend response, saving plan without resources"
            );
        }

        let mut resources = Vec::new();
        let mut position = 0i64;
        for topic in &generated.topics {
            let priority = topic.priority.unwrap_or(DEFAULT_RESOURCE_PRIORITY);
            resources.push(LearningResource {
                id: Uuid::new_v4(),
                plan_id: plan.id,
                position,
                topic: topic.topic.clone(),
                description: topic.description.clone(),
                url: None,
                resource_type: None,
                priority,
            });
            position += 1;

            // Concrete resources inherit the topic's priority.
            for resource in &topic.resources {
                resources.push(LearningResource {
                    id: Uuid::new_v4(),
                    plan_id: plan.id,
                    position,
                    topic: topic.topic.clone(),
                    description: resource.description.clone(),
                    url: resource.url.clone(),
                    resource_type: resource.resource_type.clone(),
                    priority,
                });
                position += 1;
            }
        }

        self.db.insert_learning_resources(&resources).await?;
        self.db.complete_plan(plan.id, &summary, &roadmap_text).await?;

        info!(
            plan_id = %plan.id,
            resource_count = resources.len(),
            "Learning plan completed"
        );
        Ok(())
    }
}
