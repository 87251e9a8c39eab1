use glob::Pattern;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::analysis::classifier::extension_of;
use crate::analysis::walker::WalkEntry;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Php,
    Go,
    Rust,
    Python,
    Java,
    Ruby,
    DotNet,
    Node,
    Unknown,
}

impl ProjectType {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectType::Php => "php",
            ProjectType::Go => "go",
            ProjectType::Rust => "rust",
            ProjectType::Python => "python",
            ProjectType::Java => "java",
            ProjectType::Ruby => "ruby",
            ProjectType::DotNet => "dotnet",
            ProjectType::Node => "nodejs",
            ProjectType::Unknown => "unknown",
        }
    }

    /// Human readable name used in documents.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProjectType::Php => "PHP",
            ProjectType::Go => "Go",
            ProjectType::Rust => "Rust",
            ProjectType::Python => "Python",
            ProjectType::Java => "Java",
            ProjectType::Ruby => "Ruby",
            ProjectType::DotNet => ".NET",
            ProjectType::Node => "Node.js",
            ProjectType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct Ecosystem {
    project_type: ProjectType,
    markers: &'static [&'static str],
    extensions: &'static [&'static str],
}

/// Detection table. Declaration order breaks ties in both tiers.
///
/// Node sits last because a `package.json` for front-end tooling commonly
/// ships alongside other back-ends.
const ECOSYSTEMS: &[Ecosystem] = &[
    Ecosystem {
        project_type: ProjectType::Php,
        markers: &["composer.json", "composer.lock", "artisan"],
        extensions: &[".php"],
    },
    Ecosystem {
        project_type: ProjectType::Go,
        markers: &["go.mod", "go.sum"],
        extensions: &[".go"],
    },
    Ecosystem {
        project_type: ProjectType::Rust,
        markers: &["Cargo.toml", "Cargo.lock"],
        extensions: &[".rs"],
    },
    Ecosystem {
        project_type: ProjectType::Python,
        markers: &[
            "requirements.txt",
            "requirements-dev.txt",
            "pyproject.toml",
            "setup.py",
            "Pipfile",
            "poetry.lock",
        ],
        extensions: &[".py"],
    },
    Ecosystem {
        project_type: ProjectType::Java,
        markers: &["pom.xml", "build.gradle", "build.gradle.kts"],
        extensions: &[".java", ".kt"],
    },
    Ecosystem {
        project_type: ProjectType::Ruby,
        markers: &["Gemfile", "Gemfile.lock", "*.gemspec"],
        extensions: &[".rb"],
    },
    Ecosystem {
        project_type: ProjectType::DotNet,
        markers: &["*.csproj", "*.fsproj", "*.sln"],
        extensions: &[".cs", ".fs", ".vb"],
    },
    Ecosystem {
        project_type: ProjectType::Node,
        markers: &["package.json", "package-lock.json", "yarn.lock", "pnpm-lock.yaml"],
        extensions: &[".js", ".jsx", ".mjs", ".cjs", ".ts", ".tsx"],
    },
];

static MARKER_PATTERNS: Lazy<Vec<(ProjectType, Vec<Pattern>)>> = Lazy::new(|| {
    ECOSYSTEMS
        .iter()
        .map(|eco| {
            let patterns = eco
                .markers
                .iter()
                .filter_map(|marker| Pattern::new(marker).ok())
                .collect();
            (eco.project_type, patterns)
        })
        .collect()
});

/// Marker-file tier: the first ecosystem with a marker in the root directory.
pub fn detect_by_markers(root: &Path) -> Option<ProjectType> {
    let names: Vec<String> = match std::fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect(),
        Err(err) => {
            log::debug!("Cannot list {} for marker detection: {}", root.display(), err);
            return None;
        }
    };

    MARKER_PATTERNS
        .iter()
        .find(|(_, patterns)| {
            patterns
                .iter()
                .any(|pattern| names.iter().any(|name| pattern.matches(name)))
        })
        .map(|(project_type, _)| *project_type)
}

/// Extension-frequency tier.
///
/// Counts are summed per ecosystem across all of its extensions. Among equal
/// totals the ecosystem declared first wins. No recognised extension gives
/// [`ProjectType::Unknown`].
pub fn detect_by_extensions(counts: &HashMap<String, usize>) -> ProjectType {
    let mut best = ProjectType::Unknown;
    let mut best_count = 0;

    for eco in ECOSYSTEMS {
        let total: usize = eco
            .extensions
            .iter()
            .map(|ext| counts.get(*ext).copied().unwrap_or(0))
            .sum();
        if total > best_count {
            best = eco.project_type;
            best_count = total;
        }
    }

    best
}

/// Count files per lowercased extension.
pub fn extension_counts(entries: &[WalkEntry]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for entry in entries.iter().filter(|e| !e.is_dir) {
        let ext = extension_of(Path::new(&entry.name));
        if !ext.is_empty() {
            *counts.entry(ext).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn counts(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_marker_detection() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(detect_by_markers(temp_dir.path()), Some(ProjectType::Node));
    }

    #[test]
    fn test_marker_order_breaks_ties() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), "{}").unwrap();
        fs::write(temp_dir.path().join("composer.json"), "{}").unwrap();
        assert_eq!(detect_by_markers(temp_dir.path()), Some(ProjectType::Php));
    }

    #[test]
    fn test_glob_marker() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Service.csproj"), "<Project/>").unwrap();
        assert_eq!(detect_by_markers(temp_dir.path()), Some(ProjectType::DotNet));
    }

    #[test]
    fn test_marker_directory_does_not_count() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("go.mod")).unwrap();
        assert_eq!(detect_by_markers(temp_dir.path()), None);
    }

    #[test]
    fn test_extension_frequency() {
        assert_eq!(
            detect_by_extensions(&counts(&[(".py", 3), (".js", 2)])),
            ProjectType::Python
        );
        assert_eq!(
            detect_by_extensions(&counts(&[(".ts", 2), (".tsx", 2), (".go", 3)])),
            ProjectType::Node
        );
    }

    #[test]
    fn test_extension_tie_goes_to_first_declared() {
        assert_eq!(
            detect_by_extensions(&counts(&[(".js", 2), (".go", 2), (".py", 2)])),
            ProjectType::Go
        );
    }

    #[test]
    fn test_unknown_when_nothing_matches() {
        assert_eq!(detect_by_extensions(&counts(&[(".png", 4)])), ProjectType::Unknown);
        assert_eq!(detect_by_extensions(&HashMap::new()), ProjectType::Unknown);
    }
}
