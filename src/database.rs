use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;
        let db = Database { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                summary TEXT,
                summary_status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quizzes (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                title TEXT NOT NULL,
                question_count INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quiz_questions (
                id TEXT PRIMARY KEY,
                quiz_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                question TEXT NOT NULL,
                option_a TEXT NOT NULL,
                option_b TEXT NOT NULL,
                option_c TEXT NOT NULL,
                option_d TEXT NOT NULL,
                correct_answer TEXT NOT NULL,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quiz_attempts (
                id TEXT PRIMARY KEY,
                quiz_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                score INTEGER NOT NULL,
                total INTEGER NOT NULL,
                completed_at TEXT NOT NULL,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quiz_answers (
                id TEXT PRIMARY KEY,
                attempt_id TEXT NOT NULL,
                question_id TEXT NOT NULL,
                selected_answer TEXT,
                is_correct INTEGER NOT NULL,
                FOREIGN KEY (attempt_id) REFERENCES quiz_attempts(id) ON DELETE CASCADE,
                FOREIGN KEY (question_id) REFERENCES quiz_questions(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS learning_plans (
                id TEXT PRIMARY KEY,
                attempt_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                summary TEXT NOT NULL DEFAULT '',
                roadmap TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                FOREIGN KEY (attempt_id) REFERENCES quiz_attempts(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS learning_resources (
                id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                topic TEXT NOT NULL,
                description TEXT NOT NULL,
                url TEXT,
                resource_type TEXT,
                priority INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY (plan_id) REFERENCES learning_plans(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS video_summaries (
                id TEXT PRIMARY KEY,
                source_url TEXT NOT NULL,
                video_id TEXT NOT NULL,
                summary TEXT NOT NULL DEFAULT '',
                key_points TEXT NOT NULL DEFAULT '[]',
                actionable_takeaways TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'pending',
                saved INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Document operations
    pub async fn create_document(&self, request: CreateDocumentRequest) -> Result<Document> {
        let document = Document {
            id: Uuid::new_v4(),
            title: request.title,
            content: request.content,
            summary: None,
            summary_status: GenerationStatus::Pending,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO documents (id, title, content, summary, summary_status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(document.id.to_string())
        .bind(&document.title)
        .bind(&document.content)
        .bind(&document.summary)
        .bind(document.summary_status.as_str())
        .bind(document.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(document)
    }

    pub async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT * FROM documents WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_document).transpose()
    }

    pub async fn get_all_documents(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query("SELECT * FROM documents ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_document).collect()
    }

    pub async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_document_summary(
        &self,
        id: Uuid,
        summary: &str,
        status: GenerationStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE documents SET summary = ?1, summary_status = ?2 WHERE id = ?3")
            .bind(summary)
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn update_document_summary_status(
        &self,
        id: Uuid,
        status: GenerationStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE documents SET summary_status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // Quiz operations
    pub async fn create_quiz(&self, document_id: Uuid, title: String, question_count: i64) -> Result<Quiz> {
        let quiz = Quiz {
            id: Uuid::new_v4(),
            document_id,
            title,
            question_count,
            status: GenerationStatus::Pending,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO quizzes (id, document_id, title, question_count, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(quiz.id.to_string())
        .bind(quiz.document_id.to_string())
        .bind(&quiz.title)
        .bind(quiz.question_count)
        .bind(quiz.status.as_str())
        .bind(quiz.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(quiz)
    }

    pub async fn update_quiz_status(&self, id: Uuid, status: GenerationStatus) -> Result<()> {
        sqlx::query("UPDATE quizzes SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Completion also records the number of questions actually persisted,
    /// which may be fewer than requested.
    pub async fn complete_quiz(&self, id: Uuid, question_count: i64) -> Result<()> {
        sqlx::query("UPDATE quizzes SET status = ?1, question_count = ?2 WHERE id = ?3")
            .bind(GenerationStatus::Completed.as_str())
            .bind(question_count)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_quiz(&self, id: Uuid) -> Result<Option<Quiz>> {
        let row = sqlx::query("SELECT * FROM quizzes WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_quiz).transpose()
    }

    pub async fn get_quizzes_for_document(&self, document_id: Uuid) -> Result<Vec<Quiz>> {
        let rows = sqlx::query(
            "SELECT * FROM quizzes WHERE document_id = ?1 ORDER BY created_at DESC",
        )
        .bind(document_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_quiz).collect()
    }

    pub async fn insert_quiz_questions(
        &self,
        quiz_id: Uuid,
        parsed: &[ParsedQuestion],
    ) -> Result<Vec<QuizQuestion>> {
        let mut questions = Vec::with_capacity(parsed.len());
        for (position, entry) in parsed.iter().enumerate() {
            let question = QuizQuestion {
                id: Uuid::new_v4(),
                quiz_id,
                position: position as i64,
                question: entry.question.clone(),
                option_a: entry.option_a.clone(),
                option_b: entry.option_b.clone(),
                option_c: entry.option_c.clone(),
                option_d: entry.option_d.clone(),
                correct_answer: entry.correct_answer,
            };

            sqlx::query(
                r#"
                INSERT INTO quiz_questions (id, quiz_id, position, question,
                                            option_a, option_b, option_c, option_d, correct_answer)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(question.id.to_string())
            .bind(question.quiz_id.to_string())
            .bind(question.position)
            .bind(&question.question)
            .bind(&question.option_a)
            .bind(&question.option_b)
            .bind(&question.option_c)
            .bind(&question.option_d)
            .bind(question.correct_answer.as_str())
            .execute(&self.pool)
            .await?;

            questions.push(question);
        }

        Ok(questions)
    }

    pub async fn get_questions_for_quiz(&self, quiz_id: Uuid) -> Result<Vec<QuizQuestion>> {
        let rows = sqlx::query(
            "SELECT * FROM quiz_questions WHERE quiz_id = ?1 ORDER BY position ASC",
        )
        .bind(quiz_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_question).collect()
    }

    // Attempt operations
    pub async fn create_attempt(
        &self,
        attempt: &QuizAttempt,
        answers: &[QuizAnswer],
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO quiz_attempts (id, quiz_id, user_id, score, total, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(attempt.id.to_string())
        .bind(attempt.quiz_id.to_string())
        .bind(&attempt.user_id)
        .bind(attempt.score)
        .bind(attempt.total)
        .bind(attempt.completed_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        for answer in answers {
            sqlx::query(
                r#"
                INSERT INTO quiz_answers (id, attempt_id, question_id, selected_answer, is_correct)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(answer.id.to_string())
            .bind(answer.attempt_id.to_string())
            .bind(answer.question_id.to_string())
            .bind(answer.selected_answer.map(|option| option.as_str()))
            .bind(answer.is_correct)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    pub async fn get_attempt(&self, id: Uuid) -> Result<Option<QuizAttempt>> {
        let row = sqlx::query("SELECT * FROM quiz_attempts WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_attempt).transpose()
    }

    pub async fn get_answers_for_attempt(&self, attempt_id: Uuid) -> Result<Vec<QuizAnswer>> {
        let rows = sqlx::query("SELECT * FROM quiz_answers WHERE attempt_id = ?1")
            .bind(attempt_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_answer).collect()
    }

    // Learning plan operations
    pub async fn create_plan(&self, plan: &LearningPlan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO learning_plans (id, attempt_id, user_id, summary, roadmap, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(plan.id.to_string())
        .bind(plan.attempt_id.to_string())
        .bind(&plan.user_id)
        .bind(&plan.summary)
        .bind(&plan.roadmap)
        .bind(plan.status.as_str())
        .bind(plan.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_plan_status(&self, id: Uuid, status: GenerationStatus) -> Result<()> {
        sqlx::query("UPDATE learning_plans SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn complete_plan(&self, id: Uuid, summary: &str, roadmap: &str) -> Result<()> {
        sqlx::query(
            "UPDATE learning_plans SET summary = ?1, roadmap = ?2, status = ?3 WHERE id = ?4",
        )
        .bind(summary)
        .bind(roadmap)
        .bind(GenerationStatus::Completed.as_str())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_plan(&self, id: Uuid) -> Result<Option<LearningPlan>> {
        let row = sqlx::query("SELECT * FROM learning_plans WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_plan).transpose()
    }

    pub async fn insert_learning_resources(&self, resources: &[LearningResource]) -> Result<()> {
        for resource in resources {
            sqlx::query(
                r#"
                INSERT INTO learning_resources (id, plan_id, position, topic, description,
                                                url, resource_type, priority)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(resource.id.to_string())
            .bind(resource.plan_id.to_string())
            .bind(resource.position)
            .bind(&resource.topic)
            .bind(&resource.description)
            .bind(&resource.url)
            .bind(&resource.resource_type)
            .bind(resource.priority)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    pub async fn get_resources_for_plan(&self, plan_id: Uuid) -> Result<Vec<LearningResource>> {
        let rows = sqlx::query(
            "SELECT * FROM learning_resources WHERE plan_id = ?1 ORDER BY position ASC",
        )
        .bind(plan_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_resource).collect()
    }

    // Video summary operations
    pub async fn create_video_summary(&self, summary: &VideoSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO video_summaries (id, source_url, video_id, summary, key_points,
                                         actionable_takeaways, status, saved, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(summary.id.to_string())
        .bind(&summary.source_url)
        .bind(&summary.video_id)
        .bind(&summary.summary)
        .bind(serde_json::to_string(&summary.key_points)?)
        .bind(serde_json::to_string(&summary.actionable_takeaways)?)
        .bind(summary.status.as_str())
        .bind(summary.saved)
        .bind(summary.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_video_summary_content(
        &self,
        id: Uuid,
        content: &VideoSummaryContent,
        status: GenerationStatus,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE video_summaries
            SET summary = ?1, key_points = ?2, actionable_takeaways = ?3, status = ?4
            WHERE id = ?5
            "#,
        )
        .bind(&content.summary)
        .bind(serde_json::to_string(&content.key_points)?)
        .bind(serde_json::to_string(&content.actionable_takeaways)?)
        .bind(status.as_str())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_video_summary_status(
        &self,
        id: Uuid,
        status: GenerationStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE video_summaries SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn set_video_summary_saved(&self, id: Uuid, saved: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE video_summaries SET saved = ?1 WHERE id = ?2")
            .bind(saved)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_video_summary(&self, id: Uuid) -> Result<Option<VideoSummary>> {
        let row = sqlx::query("SELECT * FROM video_summaries WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_video_summary).transpose()
    }
}

// Row mapping helpers

fn parse_uuid(value: String) -> Result<Uuid> {
    Uuid::parse_str(&value).map_err(Into::into)
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
    Ok(chrono::DateTime::parse_from_rfc3339(&value)?.with_timezone(&Utc))
}

fn parse_status(value: String) -> Result<GenerationStatus> {
    GenerationStatus::parse(&value).ok_or_else(|| anyhow!("unknown status '{}' in database", value))
}

fn parse_answer_letter(value: String) -> Result<AnswerOption> {
    AnswerOption::parse(&value).ok_or_else(|| anyhow!("invalid answer letter '{}' in database", value))
}

fn row_to_document(row: SqliteRow) -> Result<Document> {
    Ok(Document {
        id: parse_uuid(row.get("id"))?,
        title: row.get("title"),
        content: row.get("content"),
        summary: row.get("summary"),
        summary_status: parse_status(row.get("summary_status"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn row_to_quiz(row: SqliteRow) -> Result<Quiz> {
    Ok(Quiz {
        id: parse_uuid(row.get("id"))?,
        document_id: parse_uuid(row.get("document_id"))?,
        title: row.get("title"),
        question_count: row.get("question_count"),
        status: parse_status(row.get("status"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn row_to_question(row: SqliteRow) -> Result<QuizQuestion> {
    Ok(QuizQuestion {
        id: parse_uuid(row.get("id"))?,
        quiz_id: parse_uuid(row.get("quiz_id"))?,
        position: row.get("position"),
        question: row.get("question"),
        option_a: row.get("option_a"),
        option_b: row.get("option_b"),
        option_c: row.get("option_c"),
        option_d: row.get("option_d"),
        correct_answer: parse_answer_letter(row.get("correct_answer"))?,
    })
}

fn row_to_attempt(row: SqliteRow) -> Result<QuizAttempt> {
    Ok(QuizAttempt {
        id: parse_uuid(row.get("id"))?,
        quiz_id: parse_uuid(row.get("quiz_id"))?,
        user_id: row.get("user_id"),
        score: row.get("score"),
        total: row.get("total"),
        completed_at: parse_timestamp(row.get("completed_at"))?,
    })
}

fn row_to_answer(row: SqliteRow) -> Result<QuizAnswer> {
    Ok(QuizAnswer {
        id: parse_uuid(row.get("id"))?,
        attempt_id: parse_uuid(row.get("attempt_id"))?,
        question_id: parse_uuid(row.get("question_id"))?,
        selected_answer: row
            .get::<Option<String>, _>("selected_answer")
            .map(parse_answer_letter)
            .transpose()?,
        is_correct: row.get("is_correct"),
    })
}

fn row_to_plan(row: SqliteRow) -> Result<LearningPlan> {
    Ok(LearningPlan {
        id: parse_uuid(row.get("id"))?,
        attempt_id: parse_uuid(row.get("attempt_id"))?,
        user_id: row.get("user_id"),
        summary: row.get("summary"),
        roadmap: row.get("roadmap"),
        status: parse_status(row.get("status"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn row_to_resource(row: SqliteRow) -> Result<LearningResource> {
    Ok(LearningResource {
        id: parse_uuid(row.get("id"))?,
        plan_id: parse_uuid(row.get("plan_id"))?,
        position: row.get("position"),
        topic: row.get("topic"),
        description: row.get("description"),
        url: row.get("url"),
        resource_type: row.get("resource_type"),
        priority: row.get("priority"),
    })
}

fn row_to_video_summary(row: SqliteRow) -> Result<VideoSummary> {
    Ok(VideoSummary {
        id: parse_uuid(row.get("id"))?,
        source_url: row.get("source_url"),
        video_id: row.get("video_id"),
        summary: row.get("summary"),
        key_points: serde_json::from_str(&row.get::<String, _>("key_points"))?,
        actionable_takeaways: serde_json::from_str(&row.get::<String, _>("actionable_takeaways"))?,
        status: parse_status(row.get("status"))?,
        saved: row.get("saved"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}
