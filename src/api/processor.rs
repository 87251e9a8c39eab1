use anyhow::Result;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::{AnalysisError, Analyzer, CancellationToken};
use crate::api::jobs::JobTracker;
use crate::ingestion::{self, JobWorkspace};
use crate::report::DocumentGenerator;

/// Runs one uploaded archive through extraction, analysis and rendering.
#[derive(Clone)]
pub struct JobProcessor {
    workspace: JobWorkspace,
    tracker: Arc<JobTracker>,
    analyzer: Analyzer,
}

impl JobProcessor {
    pub fn new(workspace: JobWorkspace, tracker: Arc<JobTracker>) -> Self {
        JobProcessor {
            workspace,
            tracker,
            analyzer: Analyzer::new(),
        }
    }

    /// Process a job to completion and record the outcome on the tracker.
    ///
    /// Blocking; callers on an async runtime should use `spawn_blocking`.
    pub fn run(&self, job_id: &str, archive: &Path, cancel: &CancellationToken) {
        info!("Starting processing for job {}", job_id);

        let outcome = self.process(job_id, archive, cancel);

        if let Err(e) = self.workspace.cleanup(job_id) {
            warn!("Failed to clean up job {}: {}", job_id, e);
        }

        match outcome {
            Ok(document) => {
                let name = JobWorkspace::document_name(job_id);
                info!("Documentation generated for job {} at {}", job_id, document.display());
                self.tracker.complete(job_id, &name);
            }
            Err(e) if matches!(e.downcast_ref::<AnalysisError>(), Some(AnalysisError::Cancelled)) => {
                info!("Job {} cancelled", job_id);
                self.tracker.cancelled(job_id);
            }
            Err(e) => {
                error!("Job {} failed: {:#}", job_id, e);
                self.tracker.fail(job_id, &format!("{:#}", e));
            }
        }
    }

    /// Run a job on the blocking pool. A panic inside processing fails the job
    /// instead of leaving it in `processing`.
    pub fn spawn(
        &self,
        job_id: String,
        archive: PathBuf,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let worker = self.clone();
        let watcher = self.clone();
        let worker_id = job_id.clone();
        let handle =
            tokio::task::spawn_blocking(move || worker.run(&worker_id, &archive, &cancel));

        tokio::spawn(async move {
            if let Err(e) = handle.await {
                watcher.abandon(&job_id, &e.to_string());
            }
        })
    }

    /// Record a job whose worker died without reporting an outcome.
    pub fn abandon(&self, job_id: &str, reason: &str) {
        error!("Worker for job {} terminated abnormally: {}", job_id, reason);
        if let Err(e) = self.workspace.cleanup(job_id) {
            warn!("Failed to clean up job {}: {}", job_id, e);
        }
        self.tracker.fail(job_id, "internal error while processing the archive");
    }

    fn process(&self, job_id: &str, archive: &Path, cancel: &CancellationToken) -> Result<PathBuf> {
        self.tracker.extracting(job_id);
        let extracted = ingestion::extract(archive, &self.workspace.extract_dir(job_id))?;
        let root = ingestion::project_root(&extracted)?;
        info!("Extraction complete for job {}: {}", job_id, root.display());

        let result = self
            .analyzer
            .analyze_with_progress(&root, cancel, |stage| self.tracker.stage(job_id, stage))?;
        for advisory in &result.advisories {
            warn!("Job {}: {}", job_id, advisory);
        }

        cancel.check()?;
        self.tracker.rendering(job_id);
        let bytes = DocumentGenerator::new().render(&result)?;

        let output = self.workspace.document_path(job_id);
        fs::write(&output, bytes)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::jobs::JobStatus;
    use crate::config::StorageConfig;
    use std::io::Write;
    use tempfile::TempDir;

    fn setup(temp_dir: &TempDir) -> (JobProcessor, Arc<JobTracker>, JobWorkspace) {
        let config = StorageConfig {
            upload_path: temp_dir.path().join("uploads").to_string_lossy().to_string(),
            output_path: temp_dir.path().join("output").to_string_lossy().to_string(),
            max_file_size: 1024 * 1024,
        };
        let workspace = JobWorkspace::new(&config).unwrap();
        let tracker = Arc::new(JobTracker::new());
        (JobProcessor::new(workspace.clone(), tracker.clone()), tracker, workspace)
    }

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, content) in entries {
                writer.start_file(*name, zip::write::FileOptions::default()).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_successful_job() {
        let temp_dir = TempDir::new().unwrap();
        let (processor, tracker, workspace) = setup(&temp_dir);
        let bytes = zip_bytes(&[("package.json", r#"{"dependencies":{"left-pad":"1.0.0"}}"#)]);
        let archive = workspace.store_upload("job1", "code.zip", &bytes).unwrap();

        let cancel = tracker.start_job("job1");
        processor.run("job1", &archive, &cancel);

        let job = tracker.get("job1").unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        let html = fs::read_to_string(workspace.document_path("job1")).unwrap();
        assert!(html.contains("left-pad"));
        assert!(!workspace.job_dir("job1").exists());
    }

    #[test]
    fn test_unsupported_archive_fails_job() {
        let temp_dir = TempDir::new().unwrap();
        let (processor, tracker, workspace) = setup(&temp_dir);
        let archive = workspace.store_upload("job2", "code.tar", b"data").unwrap();

        let cancel = tracker.start_job("job2");
        processor.run("job2", &archive, &cancel);

        let job = tracker.get("job2").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.message.contains("unsupported archive format"));
        assert!(!workspace.document_path("job2").exists());
    }

    #[test]
    fn test_abandoned_job_is_failed_and_cleaned() {
        let temp_dir = TempDir::new().unwrap();
        let (processor, tracker, workspace) = setup(&temp_dir);
        workspace.store_upload("job4", "code.zip", b"PK").unwrap();
        tracker.start_job("job4");

        processor.abandon("job4", "task panicked");

        let job = tracker.get("job4").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(!workspace.job_dir("job4").exists());
    }

    #[actix_rt::test]
    async fn test_spawned_job_completes() {
        let temp_dir = TempDir::new().unwrap();
        let (processor, tracker, workspace) = setup(&temp_dir);
        let bytes = zip_bytes(&[("app.py", "print(1)")]);
        let archive = workspace.store_upload("job5", "code.zip", &bytes).unwrap();

        let cancel = tracker.start_job("job5");
        processor
            .spawn("job5".to_string(), archive, cancel)
            .await
            .unwrap();

        assert_eq!(tracker.get("job5").unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn test_cancelled_job() {
        let temp_dir = TempDir::new().unwrap();
        let (processor, tracker, workspace) = setup(&temp_dir);
        let bytes = zip_bytes(&[("main.go", "package main")]);
        let archive = workspace.store_upload("job3", "code.zip", &bytes).unwrap();

        let cancel = tracker.start_job("job3");
        cancel.cancel();
        processor.run("job3", &archive, &cancel);

        assert_eq!(tracker.get("job3").unwrap().status, JobStatus::Cancelled);
    }
}
