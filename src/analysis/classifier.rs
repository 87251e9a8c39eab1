use std::path::Path;

/// Label returned for extensions the language table does not know.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Lowercased extension of `path` including the leading dot, or `""`.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// Map an extension such as `".py"` to a language label.
///
/// Matching is case-insensitive. Unmapped extensions yield [`UNKNOWN_LANGUAGE`].
pub fn language_for_extension(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        ".js" | ".jsx" | ".mjs" | ".cjs" => "JavaScript",
        ".ts" | ".tsx" => "TypeScript",
        ".py" | ".pyw" => "Python",
        ".php" => "PHP",
        ".go" => "Go",
        ".rs" => "Rust",
        ".java" => "Java",
        ".kt" | ".kts" => "Kotlin",
        ".scala" => "Scala",
        ".rb" => "Ruby",
        ".cs" => "C#",
        ".c" | ".h" => "C",
        ".cpp" | ".cc" | ".cxx" | ".hpp" => "C++",
        ".swift" => "Swift",
        ".m" | ".mm" => "Objective-C",
        ".dart" => "Dart",
        ".vue" => "Vue",
        ".svelte" => "Svelte",
        ".sh" | ".bash" | ".zsh" => "Shell",
        ".ps1" => "PowerShell",
        ".sql" => "SQL",
        ".html" | ".htm" => "HTML",
        ".css" => "CSS",
        ".scss" | ".sass" => "SCSS",
        ".less" => "Less",
        ".json" => "JSON",
        ".yaml" | ".yml" => "YAML",
        ".toml" => "TOML",
        ".xml" => "XML",
        ".md" | ".markdown" => "Markdown",
        ".tf" => "HCL",
        _ => UNKNOWN_LANGUAGE,
    }
}

/// Extensions recorded in the file inventory.
///
/// Broader than the language table: config, markup and template formats count
/// as code-adjacent even when their language label is generic.
const INVENTORY_EXTENSIONS: &[&str] = &[
    ".js", ".jsx", ".mjs", ".cjs", ".ts", ".tsx", ".py", ".pyw", ".php", ".go", ".rs", ".java",
    ".kt", ".kts", ".scala", ".rb", ".cs", ".c", ".h", ".cpp", ".cc", ".cxx", ".hpp", ".swift",
    ".m", ".mm", ".dart", ".vue", ".svelte", ".sh", ".bash", ".zsh", ".ps1", ".sql", ".html",
    ".htm", ".css", ".scss", ".sass", ".less", ".json", ".yaml", ".yml", ".toml", ".xml", ".md",
    ".markdown", ".tf", ".ini", ".cfg", ".conf", ".env", ".properties", ".gradle", ".txt",
    ".rst", ".twig", ".blade", ".ejs", ".hbs", ".graphql", ".proto", ".lock", ".mod", ".sum",
];

/// Whether a file with this extension belongs in the file inventory.
pub fn is_source_extension(extension: &str) -> bool {
    let extension = extension.to_lowercase();
    INVENTORY_EXTENSIONS.contains(&extension.as_str())
}

/// Convenience over [`is_source_extension`] for a path.
pub fn is_source_file(path: &Path) -> bool {
    is_source_extension(&extension_of(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_lookup() {
        assert_eq!(language_for_extension(".py"), "Python");
        assert_eq!(language_for_extension(".PY"), "Python");
        assert_eq!(language_for_extension(".tsx"), "TypeScript");
        assert_eq!(language_for_extension(".xyz"), UNKNOWN_LANGUAGE);
        assert_eq!(language_for_extension(""), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("src/App.JSX")), ".jsx");
        assert_eq!(extension_of(Path::new("Makefile")), "");
        assert_eq!(extension_of(Path::new("archive.tar.gz")), ".gz");
    }

    #[test]
    fn test_inventory_is_broader_than_languages() {
        assert!(is_source_file(Path::new("app.py")));
        assert!(is_source_file(Path::new("config/settings.ini")));
        assert_eq!(language_for_extension(".ini"), UNKNOWN_LANGUAGE);
        assert!(!is_source_file(Path::new("logo.png")));
        assert!(!is_source_file(Path::new("Makefile")));
    }
}
