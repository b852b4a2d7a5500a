use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    ai_gateway::{self, AiGateway},
    database::Database,
    errors::{ApiError, ApiResult},
    log_service_start,
    models::{CreateVideoSummaryRequest, GenerationStatus, VideoSummary},
};

/// Video summaries from YouTube URLs.
#[derive(Clone)]
pub struct VideoService {
    db: Database,
    gateway: AiGateway,
}

impl VideoService {
    pub fn new(db: Database, gateway: AiGateway) -> Self {
        Self { db, gateway }
    }

    /// Summarize a video. The URL is rejected before any record is created or
    /// any AI call is made; after that the tiered parser guarantees a usable
    /// (possibly raw-passthrough) summary, so the record ends completed.
    pub async fn create_summary(&self, request: CreateVideoSummaryRequest) -> ApiResult<VideoSummary> {
        let video_id = ai_gateway::extract_video_id(&request.url).ok_or_else(|| {
            ApiError::ValidationError(format!(
                "'{}' is not a recognized YouTube URL",
                request.url
            ))
        })?;

        log_service_start!("video_service", "create_summary");

        let record = VideoSummary {
            id: Uuid::new_v4(),
            source_url: request.url.clone(),
            video_id,
            summary: String::new(),
            key_points: Vec::new(),
            actionable_takeaways: Vec::new(),
            status: GenerationStatus::Pending,
            saved: false,
            created_at: Utc::now(),
        };
        self.db.create_video_summary(&record).await?;
        self.db
            .update_video_summary_status(record.id, GenerationStatus::Processing)
            .await?;

        let (_, content) = self.gateway.summarize_video(&request.url).await?;
        self.db
            .update_video_summary_content(record.id, &content, GenerationStatus::Completed)
            .await?;

        info!(video_summary_id = %record.id, "Video summary completed");
        self.get_summary(record.id).await
    }

    pub async fn get_summary(&self, id: Uuid) -> ApiResult<VideoSummary> {
        self.db
            .get_video_summary(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Video summary with id '{}' not found", id)))
    }

    pub async fn set_saved(&self, id: Uuid, saved: bool) -> ApiResult<VideoSummary> {
        if !self.db.set_video_summary_saved(id, saved).await? {
            return Err(ApiError::NotFound(format!(
                "Video summary with id '{}' not found",
                id
            )));
        }
        self.get_summary(id).await
    }
}
