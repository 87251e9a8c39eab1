use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::analysis::{AnalysisStage, CancellationToken};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Percent complete, 0 to 100.
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pipeline steps around the analysis stages: extraction before, rendering after.
const EXTRACT_PROGRESS: u8 = 10;
const RENDER_PROGRESS: u8 = 90;

/// In-memory job registry.
///
/// The lock is only held to read or update a record, never across I/O.
pub struct JobTracker {
    jobs: Arc<Mutex<HashMap<String, Job>>>,
    cancels: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl JobTracker {
    pub fn new() -> Self {
        JobTracker {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            cancels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a new job and return the token that cancels it.
    pub fn start_job(&self, job_id: &str) -> CancellationToken {
        let now = Utc::now();
        let token = CancellationToken::new();
        self.jobs.lock().unwrap().insert(
            job_id.to_string(),
            Job {
                id: job_id.to_string(),
                status: JobStatus::Processing,
                progress: 0,
                message: "File uploaded successfully. Processing started.".to_string(),
                document: None,
                created_at: now,
                updated_at: now,
            },
        );
        self.cancels.lock().unwrap().insert(job_id.to_string(), token.clone());
        token
    }

    fn update<F: FnOnce(&mut Job)>(&self, job_id: &str, apply: F) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            apply(job);
            job.updated_at = Utc::now();
        }
    }

    pub fn extracting(&self, job_id: &str) {
        self.update(job_id, |job| {
            job.progress = EXTRACT_PROGRESS;
            job.message = "Extracting archive".to_string();
        });
    }

    /// Map an analysis stage onto the span between extraction and rendering.
    pub fn stage(&self, job_id: &str, stage: AnalysisStage) {
        let span = (RENDER_PROGRESS - EXTRACT_PROGRESS) as u32;
        let progress = EXTRACT_PROGRESS as u32 + span * (stage.position() - 1) / AnalysisStage::COUNT;
        self.update(job_id, |job| {
            job.progress = progress as u8;
            job.message = stage.name().to_string();
        });
    }

    pub fn rendering(&self, job_id: &str) {
        self.update(job_id, |job| {
            job.progress = RENDER_PROGRESS;
            job.message = "Generating documentation".to_string();
        });
    }

    pub fn complete(&self, job_id: &str, document: &str) {
        self.update(job_id, |job| {
            job.status = JobStatus::Completed;
            job.progress = 100;
            job.message = "Documentation generated successfully".to_string();
            job.document = Some(document.to_string());
        });
        self.cancels.lock().unwrap().remove(job_id);
    }

    pub fn fail(&self, job_id: &str, error: &str) {
        self.update(job_id, |job| {
            job.status = JobStatus::Failed;
            job.message = format!("Processing failed: {}", error);
        });
        self.cancels.lock().unwrap().remove(job_id);
    }

    pub fn cancelled(&self, job_id: &str) {
        self.update(job_id, |job| {
            job.status = JobStatus::Cancelled;
            job.message = "Processing cancelled".to_string();
        });
        self.cancels.lock().unwrap().remove(job_id);
    }

    /// Raise the cancellation signal of a running job. Returns false if the
    /// job is unknown or already finished.
    pub fn cancel(&self, job_id: &str) -> bool {
        match self.cancels.lock().unwrap().get(job_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, job_id: &str) -> Option<Job> {
        self.jobs.lock().unwrap().get(job_id).cloned()
    }

    /// Drop finished jobs whose last update is older than `max_age` and return
    /// them. Jobs still processing are never evicted.
    pub fn evict_finished(&self, max_age: Duration) -> Vec<Job> {
        let cutoff = Utc::now() - max_age;
        let mut jobs = self.jobs.lock().unwrap();
        let expired: Vec<String> = jobs
            .values()
            .filter(|job| job.status != JobStatus::Processing && job.updated_at <= cutoff)
            .map(|job| job.id.clone())
            .collect();
        expired
            .iter()
            .filter_map(|id| jobs.remove(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_lifecycle() {
        let tracker = JobTracker::new();
        tracker.start_job("abc");
        assert_eq!(tracker.get("abc").unwrap().status, JobStatus::Processing);

        tracker.extracting("abc");
        tracker.stage("abc", AnalysisStage::Init);
        assert_eq!(tracker.get("abc").unwrap().progress, EXTRACT_PROGRESS);

        tracker.stage("abc", AnalysisStage::Assembled);
        let job = tracker.get("abc").unwrap();
        assert!(job.progress > EXTRACT_PROGRESS && job.progress < RENDER_PROGRESS);

        tracker.complete("abc", "abc_documentation.html");
        let job = tracker.get("abc").unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.document.as_deref(), Some("abc_documentation.html"));
        assert!(!tracker.cancel("abc"));
    }

    #[test]
    fn test_cancel_running_job() {
        let tracker = JobTracker::new();
        let token = tracker.start_job("job");

        assert!(tracker.cancel("job"));
        assert!(token.is_cancelled());
        assert!(!tracker.cancel("missing"));
    }

    #[test]
    fn test_evict_finished_keeps_running_and_recent_jobs() {
        let tracker = JobTracker::new();
        tracker.start_job("done");
        tracker.complete("done", "done_documentation.html");
        tracker.start_job("broken");
        tracker.fail("broken", "boom");
        tracker.start_job("running");

        assert!(tracker.evict_finished(Duration::hours(1)).is_empty());
        assert_eq!(tracker.len(), 3);

        let mut evicted: Vec<String> = tracker
            .evict_finished(Duration::zero())
            .into_iter()
            .map(|job| job.id)
            .collect();
        evicted.sort();

        assert_eq!(evicted, vec!["broken", "done"]);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.get("running").is_some());

        tracker.cancelled("running");
        tracker.evict_finished(Duration::zero());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_unknown_job() {
        let tracker = JobTracker::new();
        tracker.fail("nope", "boom");
        assert!(tracker.get("nope").is_none());
    }
}
