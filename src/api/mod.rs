use actix_web::{HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ingestion::JobWorkspace;

pub mod documentation;
pub mod jobs;
pub mod processor;
pub mod server;
pub mod upload;

pub use jobs::{Job, JobStatus, JobTracker};
pub use processor::JobProcessor;

pub struct ApiState {
    pub workspace: JobWorkspace,
    pub tracker: Arc<JobTracker>,
    pub processor: JobProcessor,
    /// Largest accepted archive, in bytes.
    pub max_upload_size: u64,
}

impl ApiState {
    pub fn new(workspace: JobWorkspace, max_upload_size: u64) -> Self {
        let tracker = Arc::new(JobTracker::new());
        let processor = JobProcessor::new(workspace.clone(), tracker.clone());
        ApiState {
            workspace,
            tracker,
            processor,
            max_upload_size,
        }
    }

    /// Evict finished jobs older than `max_age` along with their documents.
    pub fn sweep_finished_jobs(&self, max_age: chrono::Duration) -> usize {
        let evicted = self.tracker.evict_finished(max_age);
        for job in &evicted {
            if job.document.is_some() {
                let path = self.workspace.document_path(&job.id);
                if let Err(e) = std::fs::remove_file(&path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        log::warn!("Failed to remove document {}: {}", path.display(), e);
                    }
                }
            }
        }
        if !evicted.is_empty() {
            log::info!("Evicted {} finished jobs", evicted.len());
        }
        evicted.len()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorResponse { error: error.into() }
    }
}

// Health check endpoint
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "code-doc-tool"
    }))
}
