use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::{
    ai_gateway::AiGateway,
    database::Database,
    errors::{ApiError, ApiResult},
    log_service_start, log_service_success,
    models::{CreateDocumentRequest, Document, GenerationStatus},
};

/// Documents and their summaries. Summary generation runs inline in the
/// request that asked for it.
#[derive(Clone)]
pub struct DocumentService {
    db: Database,
    gateway: AiGateway,
}

impl DocumentService {
    pub fn new(db: Database, gateway: AiGateway) -> Self {
        Self { db, gateway }
    }

    pub async fn create_document(&self, request: CreateDocumentRequest) -> ApiResult<Document> {
        if request.title.trim().is_empty() {
            return Err(ApiError::ValidationError("title cannot be empty".to_string()));
        }
        if request.content.trim().is_empty() {
            return Err(ApiError::ValidationError(
                "document content cannot be empty".to_string(),
            ));
        }

        let document = self.db.create_document(request).await?;
        info!(document_id = %document.id, "Document created");
        Ok(document)
    }

    pub async fn get_document(&self, id: Uuid) -> ApiResult<Document> {
        self.db
            .get_document(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Document with id '{}' not found", id)))
    }

    pub async fn get_all_documents(&self) -> ApiResult<Vec<Document>> {
        Ok(self.db.get_all_documents().await?)
    }

    pub async fn delete_document(&self, id: Uuid) -> ApiResult<()> {
        if !self.db.delete_document(id).await? {
            return Err(ApiError::NotFound(format!("Document with id '{}' not found", id)));
        }
        Ok(())
    }

    /// Generate and persist a summary for the document. The gateway never
    /// fails here (it degrades internally), so the summary status only moves
    /// processing -> completed.
    pub async fn generate_summary(&self, id: Uuid) -> ApiResult<Document> {
        let document = self.get_document(id).await?;
        log_service_start!("document_service", "generate_summary", document_id = id);

        self.db
            .update_document_summary_status(id, GenerationStatus::Processing)
            .await?;

        let summary = self.gateway.summarize(&document.content).await;
        self.db
            .update_document_summary(id, &summary, GenerationStatus::Completed)
            .await?;

        log_service_success!("document_service", "generate_summary", "summary persisted");
        self.get_document(id).await
    }

    /// Streaming variant: chunks are forwarded into `tx` as they arrive and
    /// the accumulated summary is persisted once the stream ends.
    pub async fn stream_summary(&self, document: Document, tx: mpsc::Sender<String>) -> ApiResult<()> {
        log_service_start!(
            "document_service",
            "stream_summary",
            document_id = document.id
        );

        self.db
            .update_document_summary_status(document.id, GenerationStatus::Processing)
            .await?;

        // Hold our sender until the summary is persisted so the client's
        // stream only closes once the record is up to date.
        let summary = self
            .gateway
            .summarize_stream(&document.content, tx.clone())
            .await;
        self.db
            .update_document_summary(document.id, &summary, GenerationStatus::Completed)
            .await?;
        drop(tx);

        log_service_success!("document_service", "stream_summary", "streamed summary persisted");
        Ok(())
    }
}
