use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::analysis::classifier::UNKNOWN_LANGUAGE;
use crate::analysis::dependencies::DependencyGroups;
use crate::analysis::project_type::ProjectType;
use crate::analysis::result::FileRecord;
use crate::analysis::tree::DirectoryNode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LanguageStat {
    pub language: String,
    pub files: usize,
    pub bytes: u64,
    pub percent: f32,
}

/// Share of recorded files per language label, largest first.
///
/// Files labelled unknown are left out; percentages are by file count.
pub fn language_distribution(files: &[FileRecord]) -> Vec<LanguageStat> {
    let mut by_language: HashMap<&str, (usize, u64)> = HashMap::new();
    for file in files.iter().filter(|f| f.language != UNKNOWN_LANGUAGE) {
        let slot = by_language.entry(file.language.as_str()).or_insert((0, 0));
        slot.0 += 1;
        slot.1 += file.size;
    }

    let total: usize = by_language.values().map(|(count, _)| count).sum();
    let mut stats: Vec<LanguageStat> = by_language
        .into_iter()
        .map(|(language, (files, bytes))| LanguageStat {
            language: language.to_string(),
            files,
            bytes,
            percent: files as f32 * 100.0 / total.max(1) as f32,
        })
        .collect();
    stats.sort_by(|a, b| b.files.cmp(&a.files).then_with(|| a.language.cmp(&b.language)));
    stats
}

/// Conventional directory names and what they usually hold.
const FOLDER_PURPOSES: &[(&str, &str)] = &[
    ("src", "Main source code"),
    ("lib", "Library code and shared modules"),
    ("app", "Application code"),
    ("cmd", "Command-line entry points"),
    ("internal", "Internal packages not meant for external use"),
    ("pkg", "Reusable packages"),
    ("api", "API definitions and handlers"),
    ("routes", "Route definitions"),
    ("controllers", "Request controllers"),
    ("handlers", "Request handlers"),
    ("models", "Data models"),
    ("services", "Business logic services"),
    ("utils", "Utility helpers"),
    ("helpers", "Utility helpers"),
    ("middleware", "Request middleware"),
    ("config", "Configuration files"),
    ("components", "UI components"),
    ("pages", "Page components"),
    ("views", "View templates"),
    ("templates", "Templates"),
    ("public", "Publicly served static assets"),
    ("static", "Static assets"),
    ("assets", "Images, styles and other assets"),
    ("styles", "Stylesheets"),
    ("migrations", "Database migrations"),
    ("database", "Database schema, seeds and migrations"),
    ("scripts", "Build and maintenance scripts"),
    ("tests", "Test suites"),
    ("test", "Test suites"),
    ("__tests__", "Test suites"),
    ("spec", "Test specifications"),
    ("docs", "Documentation"),
    ("examples", "Usage examples"),
    ("deploy", "Deployment configuration"),
    ("docker", "Container configuration"),
];

/// Describe what a directory is for from its name, if it is a known convention.
pub fn folder_purpose(name: &str) -> Option<&'static str> {
    let lowered = name.to_lowercase();
    FOLDER_PURPOSES
        .iter()
        .find(|(folder, _)| *folder == lowered)
        .map(|(_, purpose)| *purpose)
}

/// Relative directory path to description for every directory in the tree.
///
/// Unrecognised directories get a generic description naming their contents.
pub fn folder_structure(root: &DirectoryNode) -> BTreeMap<String, String> {
    let mut structure = BTreeMap::new();
    collect_folders(root, &mut structure);
    structure
}

fn collect_folders(node: &DirectoryNode, structure: &mut BTreeMap<String, String>) {
    for child in node.children.iter().filter(|c| c.is_dir) {
        let description = match folder_purpose(&child.name) {
            Some(purpose) => purpose.to_string(),
            None => {
                let files = child.children.iter().filter(|c| !c.is_dir).count();
                let dirs = child.children.len() - files;
                format!("Contains {} files and {} subdirectories", files, dirs)
            }
        };
        structure.insert(child.path.clone(), description);
        collect_folders(child, structure);
    }
}

/// Dependency names that identify a well-known framework or library.
const KNOWN_FRAMEWORKS: &[(&str, &str)] = &[
    ("express", "Express"),
    ("react", "React"),
    ("next", "Next.js"),
    ("vue", "Vue.js"),
    ("nuxt", "Nuxt"),
    ("@angular/core", "Angular"),
    ("svelte", "Svelte"),
    ("@nestjs/core", "NestJS"),
    ("fastify", "Fastify"),
    ("koa", "Koa"),
    ("typescript", "TypeScript"),
    ("laravel/framework", "Laravel"),
    ("symfony/symfony", "Symfony"),
    ("symfony/framework-bundle", "Symfony"),
    ("slim/slim", "Slim"),
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("sqlalchemy", "SQLAlchemy"),
    ("github.com/gin-gonic/gin", "Gin"),
    ("github.com/gofiber/fiber/v2", "Fiber"),
    ("github.com/labstack/echo/v4", "Echo"),
    ("gorm.io/gorm", "GORM"),
    ("actix-web", "Actix Web"),
    ("axum", "Axum"),
    ("rocket", "Rocket"),
    ("tokio", "Tokio"),
    ("org.springframework.boot:spring-boot-starter-web", "Spring Boot"),
    ("org.springframework:spring-core", "Spring"),
    ("rails", "Ruby on Rails"),
    ("sinatra", "Sinatra"),
];

/// Project type, languages present and recognised frameworks, without repeats.
pub fn tech_stack(
    project_type: ProjectType,
    languages: &[LanguageStat],
    dependencies: &DependencyGroups,
) -> Vec<String> {
    let mut stack: Vec<String> = Vec::new();
    let mut add = |item: &str| {
        if !stack.iter().any(|s| s == item) {
            stack.push(item.to_string());
        }
    };

    if project_type != ProjectType::Unknown {
        add(project_type.display_name());
    }
    for stat in languages {
        add(&stat.language);
    }
    for dep in dependencies.all() {
        if let Some((_, framework)) = KNOWN_FRAMEWORKS.iter().find(|(name, _)| *name == dep.name) {
            add(framework);
        }
    }

    stack
}

/// One-paragraph project overview.
pub fn overview(
    name: &str,
    project_type: ProjectType,
    files: &[FileRecord],
    languages: &[LanguageStat],
    dependencies: &DependencyGroups,
) -> String {
    let mut text = if project_type == ProjectType::Unknown {
        format!("{} is a project of undetermined type", name)
    } else {
        format!("{} is a {} project", name, project_type.display_name())
    };

    text.push_str(&format!(" containing {} source files", files.len()));
    if let Some(primary) = languages.first() {
        text.push_str(&format!(
            ", primarily written in {} ({:.0}% of files)",
            primary.language, primary.percent
        ));
    }
    text.push('.');

    if dependencies.is_empty() {
        text.push_str(" No declared dependencies were found.");
    } else {
        let groups: Vec<String> = dependencies
            .iter()
            .filter(|(_, deps)| !deps.is_empty())
            .map(|(kind, deps)| format!("{} {}", deps.len(), kind))
            .collect();
        text.push_str(&format!(
            " It declares {} dependencies ({}).",
            dependencies.len(),
            groups.join(", ")
        ));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::dependencies::{Dependency, DependencyKind};

    fn record(path: &str, language: &str, size: u64) -> FileRecord {
        FileRecord {
            name: path.rsplit('/').next().unwrap().to_string(),
            path: path.to_string(),
            extension: String::new(),
            size,
            language: language.to_string(),
        }
    }

    #[test]
    fn test_language_distribution() {
        let files = vec![
            record("a.py", "Python", 10),
            record("b.py", "Python", 20),
            record("c.js", "JavaScript", 5),
            record("d.ini", UNKNOWN_LANGUAGE, 1),
        ];

        let stats = language_distribution(&files);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].language, "Python");
        assert_eq!(stats[0].files, 2);
        assert_eq!(stats[0].bytes, 30);
        assert!((stats[0].percent - 66.666).abs() < 0.1);
    }

    #[test]
    fn test_folder_structure() {
        let mut root = DirectoryNode::root("root");
        let mut src = DirectoryNode::root("src");
        src.path = "src".to_string();
        let mut misc = DirectoryNode::root("misc");
        misc.path = "src/misc".to_string();
        src.children.push(misc);
        root.children.push(src);

        let structure = folder_structure(&root);

        assert_eq!(structure["src"], "Main source code");
        assert_eq!(structure["src/misc"], "Contains 0 files and 0 subdirectories");
    }

    #[test]
    fn test_tech_stack_recognises_frameworks() {
        let mut deps = DependencyGroups::new();
        deps.push(Dependency::new("express", "^4", DependencyKind::Production));
        deps.push(Dependency::new("express", "^5", DependencyKind::Production));
        let languages = vec![LanguageStat {
            language: "JavaScript".into(),
            files: 1,
            bytes: 1,
            percent: 100.0,
        }];

        let stack = tech_stack(ProjectType::Node, &languages, &deps);

        assert_eq!(stack, vec!["Node.js", "JavaScript", "Express"]);
    }

    #[test]
    fn test_overview_mentions_dependencies() {
        let mut deps = DependencyGroups::new();
        deps.push(Dependency::new("left-pad", "1.0.0", DependencyKind::Production));

        let text = overview("demo", ProjectType::Node, &[], &[], &deps);

        assert!(text.starts_with("demo is a Node.js project containing 0 source files."));
        assert!(text.contains("1 production"));
    }
}
