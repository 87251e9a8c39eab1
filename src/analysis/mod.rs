pub mod analyzer;
pub mod cancel;
pub mod classifier;
pub mod dependencies;
pub mod error;
pub mod project_type;
pub mod result;
pub mod summary;
pub mod tree;
pub mod walker;

pub use analyzer::{detect_project_type, AnalysisStage, Analyzer};
pub use cancel::CancellationToken;
pub use classifier::{extension_of, is_source_extension, is_source_file, language_for_extension, UNKNOWN_LANGUAGE};
pub use dependencies::{extract_dependencies, extractor_for, Dependency, DependencyGroups, DependencyKind};
pub use error::{Advisory, AdvisoryKind, AnalysisError, ManifestParseError};
pub use project_type::ProjectType;
pub use result::{AnalysisResult, FileRecord};
pub use summary::LanguageStat;
pub use tree::{DirectoryNode, DirectoryTreeBuilder, TreeBuild};
pub use walker::{IgnorePolicy, WalkEntry, WalkError, Walker};
