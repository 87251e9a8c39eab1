use chrono::Utc;
use std::fmt;
use std::path::Path;

use crate::analysis::cancel::CancellationToken;
use crate::analysis::classifier::{extension_of, is_source_extension, language_for_extension};
use crate::analysis::dependencies::{extract_dependencies, DependencyGroups};
use crate::analysis::error::{Advisory, AdvisoryKind, AnalysisError};
use crate::analysis::project_type::{detect_by_extensions, detect_by_markers, extension_counts, ProjectType};
use crate::analysis::result::{AnalysisResult, FileRecord};
use crate::analysis::summary;
use crate::analysis::tree::DirectoryTreeBuilder;
use crate::analysis::walker::{IgnorePolicy, WalkEntry, WalkOutput, Walker};

/// Steps of one analysis run, in the order they execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Init,
    TypeDetection,
    DependencyExtraction,
    TreeConstruction,
    FileClassification,
    Assembled,
}

impl AnalysisStage {
    pub const COUNT: u32 = 6;

    /// 1-based position, used for progress reporting.
    pub fn position(&self) -> u32 {
        match self {
            AnalysisStage::Init => 1,
            AnalysisStage::TypeDetection => 2,
            AnalysisStage::DependencyExtraction => 3,
            AnalysisStage::TreeConstruction => 4,
            AnalysisStage::FileClassification => 5,
            AnalysisStage::Assembled => 6,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnalysisStage::Init => "Validating project root",
            AnalysisStage::TypeDetection => "Detecting project type",
            AnalysisStage::DependencyExtraction => "Extracting dependencies",
            AnalysisStage::TreeConstruction => "Building directory tree",
            AnalysisStage::FileClassification => "Classifying files",
            AnalysisStage::Assembled => "Assembling result",
        }
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs the whole analysis over one extracted project root.
///
/// A run only reads the filesystem, so analysing the same root twice gives the
/// same result apart from `created_at`. Separate runs share nothing.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    policy: IgnorePolicy,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: IgnorePolicy) -> Self {
        Analyzer { policy }
    }

    pub fn analyze(&self, root: &Path) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with_progress(root, &CancellationToken::new(), |_| {})
    }

    pub fn analyze_with_cancel(
        &self,
        root: &Path,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with_progress(root, cancel, |_| {})
    }

    /// Run every stage, calling `on_stage` as each one starts.
    ///
    /// Only an invalid root or cancellation fail the run; other problems end up
    /// in [`AnalysisResult::advisories`].
    pub fn analyze_with_progress<F>(
        &self,
        root: &Path,
        cancel: &CancellationToken,
        mut on_stage: F,
    ) -> Result<AnalysisResult, AnalysisError>
    where
        F: FnMut(AnalysisStage),
    {
        let mut enter = |stage: AnalysisStage| -> Result<(), AnalysisError> {
            cancel.check()?;
            log::debug!("Analysis of {}: {}", root.display(), stage);
            on_stage(stage);
            Ok(())
        };

        enter(AnalysisStage::Init)?;
        validate_root(root)?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string());
        let walker = Walker::new(root, self.policy.clone());
        let mut walk: Option<WalkOutput> = None;
        let mut advisories: Vec<Advisory> = Vec::new();

        enter(AnalysisStage::TypeDetection)?;
        let project_type = match detect_by_markers(root) {
            Some(project_type) => project_type,
            None => {
                let output = walker.collect(cancel)?;
                let project_type = detect_by_extensions(&extension_counts(&output.entries));
                walk = Some(output);
                project_type
            }
        };

        enter(AnalysisStage::DependencyExtraction)?;
        let dependencies = match extract_dependencies(project_type, root) {
            Ok(groups) => groups,
            Err(err) => {
                log::warn!("Dependency extraction degraded for {}: {}", root.display(), err);
                advisories.push(err.into());
                DependencyGroups::new()
            }
        };

        enter(AnalysisStage::TreeConstruction)?;
        let walk = match walk {
            Some(output) => output,
            None => walker.collect(cancel)?,
        };
        advisories.extend(walk.failures);
        let tree = DirectoryTreeBuilder::new(name.clone()).build(&walk.entries);
        for orphan in &tree.orphans {
            advisories.push(Advisory::new(
                AdvisoryKind::TreeIntegrityFailure,
                orphan.path.clone(),
                "parent directory missing from the walked entries",
            ));
        }

        enter(AnalysisStage::FileClassification)?;
        let files = classify_files(&walk.entries);

        enter(AnalysisStage::Assembled)?;
        let language_distribution = summary::language_distribution(&files);
        let tech_stack = summary::tech_stack(project_type, &language_distribution, &dependencies);
        let overview = summary::overview(
            &name,
            project_type,
            &files,
            &language_distribution,
            &dependencies,
        );
        let folder_structure = summary::folder_structure(&tree.root);

        log::info!(
            "Analyzed {}: type={}, files={}, dependencies={}, advisories={}",
            name,
            project_type,
            files.len(),
            dependencies.len(),
            advisories.len()
        );

        Ok(AnalysisResult {
            name,
            project_type,
            overview,
            tech_stack,
            folder_structure,
            dependencies,
            files,
            structure: tree.root,
            language_distribution,
            orphaned_nodes: tree.orphans,
            advisories,
            created_at: Utc::now(),
        })
    }
}

fn validate_root(root: &Path) -> Result<(), AnalysisError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(AnalysisError::InvalidInput {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        }),
        Err(err) => Err(AnalysisError::InvalidInput {
            path: root.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

/// File inventory: every walked file whose extension qualifies as source.
fn classify_files(entries: &[WalkEntry]) -> Vec<FileRecord> {
    entries
        .iter()
        .filter(|entry| !entry.is_dir)
        .filter_map(|entry| {
            let extension = extension_of(Path::new(&entry.name));
            if !is_source_extension(&extension) {
                return None;
            }
            Some(FileRecord {
                name: entry.name.clone(),
                path: entry.relative_path.clone(),
                language: language_for_extension(&extension).to_string(),
                extension,
                size: entry.size,
            })
        })
        .collect()
}

/// Convenience wrapper used by callers that only need a type label.
pub fn detect_project_type(root: &Path) -> ProjectType {
    if let Some(project_type) = detect_by_markers(root) {
        return project_type;
    }
    let walker = Walker::new(root, IgnorePolicy::default());
    match walker.collect(&CancellationToken::new()) {
        Ok(output) => detect_by_extensions(&extension_counts(&output.entries)),
        Err(_) => ProjectType::Unknown,
    }
}
