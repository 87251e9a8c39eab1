use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::dependencies::DependencyGroups;
use crate::analysis::error::Advisory;
use crate::analysis::project_type::ProjectType;
use crate::analysis::summary::LanguageStat;
use crate::analysis::tree::DirectoryNode;

/// One inventoried file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub path: String,
    pub extension: String,
    pub size: u64,
    pub language: String,
}

/// Everything one analysis run determined about a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub name: String,
    pub project_type: ProjectType,
    pub overview: String,
    pub tech_stack: Vec<String>,
    pub folder_structure: BTreeMap<String, String>,
    pub dependencies: DependencyGroups,
    pub files: Vec<FileRecord>,
    pub structure: DirectoryNode,
    pub language_distribution: Vec<LanguageStat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphaned_nodes: Vec<DirectoryNode>,
    pub advisories: Vec<Advisory>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn is_degraded(&self) -> bool {
        !self.advisories.is_empty()
    }
}
