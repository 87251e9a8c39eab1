use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;

/// On-disk layout for uploads, extracted trees and rendered documents.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    upload_path: PathBuf,
    output_path: PathBuf,
}

impl JobWorkspace {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let upload_path = PathBuf::from(&config.upload_path);
        let output_path = PathBuf::from(&config.output_path);

        fs::create_dir_all(&upload_path)?;
        fs::create_dir_all(&output_path)?;

        Ok(JobWorkspace {
            upload_path,
            output_path,
        })
    }

    /// `<upload>/<job_id>`
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.upload_path.join(job_id)
    }

    /// `<upload>/<job_id>/extracted`
    pub fn extract_dir(&self, job_id: &str) -> PathBuf {
        self.job_dir(job_id).join("extracted")
    }

    pub fn document_name(job_id: &str) -> String {
        format!("{}_documentation.html", job_id)
    }

    /// `<output>/<job_id>_documentation.html`
    pub fn document_path(&self, job_id: &str) -> PathBuf {
        self.output_path.join(Self::document_name(job_id))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_path
    }

    /// Store an uploaded archive under the job directory and return its path.
    pub fn store_upload(&self, job_id: &str, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.job_dir(job_id);
        fs::create_dir_all(&dir)?;

        let base_name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid upload file name: {}", file_name))?;
        let path = dir.join(base_name);
        fs::write(&path, bytes)?;
        log::info!("Stored upload for job {} at {}", job_id, path.display());
        Ok(path)
    }

    /// Resolve a requested document name inside the output directory.
    ///
    /// Names with path separators or parent references are refused.
    pub fn resolve_document(&self, file_name: &str) -> Option<PathBuf> {
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return None;
        }
        Some(self.output_path.join(file_name))
    }

    /// Remove everything stored for a job except its rendered document.
    pub fn cleanup(&self, job_id: &str) -> Result<()> {
        let dir = self.job_dir(job_id);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
            log::debug!("Removed job directory {}", dir.display());
        }
        Ok(())
    }
}
